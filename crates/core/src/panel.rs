use crate::session::CallStatus;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

const FIRST_NAMES: &[&str] = &[
    "Avery", "Jordan", "Priya", "Mateo", "Hannah", "Kenji", "Amara", "Lucas", "Sofia", "Daniel",
    "Leila", "Marcus", "Elena", "Tomas", "Nadia", "Oliver",
];
const LEAD_TITLES: &[&str] = &[
    "Engineering Manager",
    "Principal Engineer",
    "Staff Engineer",
    "Tech Lead",
];
const HR_TITLES: &[&str] = &[
    "HR Business Partner",
    "Talent Acquisition Lead",
    "People Partner",
];
const OBSERVER_TITLES: &[&str] = &[
    "Senior Engineer",
    "Product Manager",
    "Team Member",
    "Designer",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelistId(String);

impl PanelistId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PanelistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PanelRole {
    LeadInterviewer,
    HumanResources,
    Observer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panelist {
    pub id: PanelistId,
    pub name: String,
    pub title: String,
    pub role: PanelRole,
}

/// Overall flavour of the interview, chosen when it was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewType {
    Technical,
    Behavioral,
    Mixed,
}

impl InterviewType {
    /// Classifies the question at `index` (1-based). Mixed interviews
    /// alternate, starting with a technical question.
    pub fn question_type(&self, index: usize) -> QuestionType {
        if index == 0 {
            return QuestionType::None;
        }
        match self {
            InterviewType::Technical => QuestionType::Technical,
            InterviewType::Behavioral => QuestionType::Behavioral,
            InterviewType::Mixed if index % 2 == 1 => QuestionType::Technical,
            InterviewType::Mixed => QuestionType::Behavioral,
        }
    }
}

impl std::str::FromStr for InterviewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "technical" => Ok(InterviewType::Technical),
            "behavioral" | "behavioural" => Ok(InterviewType::Behavioral),
            "mixed" | "balanced" => Ok(InterviewType::Mixed),
            other => Err(format!("unknown interview type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Technical,
    Behavioral,
    None,
}

/// The simulated interview panel. Generated once per session and read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    panelists: Vec<Panelist>,
}

impl Panel {
    /// Builds a panel of three or four members. The same interview id and
    /// role always produce the same panel.
    pub fn generate(interview_id: &str, job_role: &str) -> Self {
        let mut rng = StdRng::seed_from_u64(seed_for(interview_id, job_role));

        let mut names = FIRST_NAMES.to_vec();
        names.shuffle(&mut rng);
        let mut panelists = vec![
            Panelist {
                id: PanelistId::new(format!("{interview_id}-lead")),
                name: names[0].to_string(),
                title: pick(&mut rng, LEAD_TITLES),
                role: PanelRole::LeadInterviewer,
            },
            Panelist {
                id: PanelistId::new(format!("{interview_id}-hr")),
                name: names[1].to_string(),
                title: pick(&mut rng, HR_TITLES),
                role: PanelRole::HumanResources,
            },
        ];
        let observers = if rng.gen_bool(0.5) { 2 } else { 1 };
        for n in 1..=observers {
            panelists.push(Panelist {
                id: PanelistId::new(format!("{interview_id}-observer-{n}")),
                name: names[1 + n].to_string(),
                title: pick(&mut rng, OBSERVER_TITLES),
                role: PanelRole::Observer,
            });
        }

        Self { panelists }
    }

    pub fn panelists(&self) -> &[Panelist] {
        &self.panelists
    }

    pub fn get(&self, id: &PanelistId) -> Option<&Panelist> {
        self.panelists.iter().find(|p| &p.id == id)
    }

    pub fn by_role(&self, role: PanelRole) -> Option<&Panelist> {
        self.panelists.iter().find(|p| p.role == role)
    }

    pub fn lead(&self) -> Option<&Panelist> {
        self.by_role(PanelRole::LeadInterviewer)
    }

    pub fn hr(&self) -> Option<&Panelist> {
        self.by_role(PanelRole::HumanResources)
    }

    pub fn len(&self) -> usize {
        self.panelists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panelists.is_empty()
    }
}

fn pick(rng: &mut StdRng, pool: &[&str]) -> String {
    pool[rng.gen_range(0..pool.len())].to_string()
}

// FNV-1a, so the seed is stable across builds and platforms.
fn seed_for(interview_id: &str, job_role: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in interview_id
        .bytes()
        .chain(std::iter::once(0))
        .chain(job_role.to_lowercase().bytes())
    {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Who is expected to speak for the current question: technical questions
/// belong to the lead interviewer, behavioral ones to HR. Nobody speaks
/// outside a live call.
pub fn expected_speaker(
    panel: &Panel,
    status: CallStatus,
    question_type: QuestionType,
) -> Option<PanelistId> {
    if status != CallStatus::Active {
        return None;
    }
    match question_type {
        QuestionType::Technical => panel.lead().map(|p| p.id.clone()),
        QuestionType::Behavioral => panel.hr().map(|p| p.id.clone()),
        QuestionType::None => None,
    }
}

/// Inputs available to a [`SpeakerPolicy`] when the provider reports speech.
pub struct SpeakerContext<'a> {
    pub panel: &'a Panel,
    pub expected: Option<&'a PanelistId>,
    pub question_index: usize,
}

/// Decides which panelist appears to be talking when the assistant voice
/// starts speaking.
pub trait SpeakerPolicy: Send + Sync {
    fn pick_speaker(&mut self, context: &SpeakerContext<'_>) -> Option<PanelistId>;
}

/// Picks any panelist at random on every utterance.
pub struct RandomSpeakerPolicy {
    rng: StdRng,
}

impl RandomSpeakerPolicy {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomSpeakerPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeakerPolicy for RandomSpeakerPolicy {
    fn pick_speaker(&mut self, context: &SpeakerContext<'_>) -> Option<PanelistId> {
        context
            .panel
            .panelists()
            .choose(&mut self.rng)
            .map(|p| p.id.clone())
    }
}

/// Gives the floor to whoever owns the current question type, falling back
/// to the lead interviewer.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpectedSpeakerPolicy;

impl SpeakerPolicy for ExpectedSpeakerPolicy {
    fn pick_speaker(&mut self, context: &SpeakerContext<'_>) -> Option<PanelistId> {
        context
            .expected
            .cloned()
            .or_else(|| context.panel.lead().map(|p| p.id.clone()))
    }
}

/// Holds the single "who is speaking right now" signal.
pub struct SpeakerCoordinator {
    policy: Box<dyn SpeakerPolicy>,
    speaking: Option<PanelistId>,
}

impl SpeakerCoordinator {
    pub fn new(policy: Box<dyn SpeakerPolicy>) -> Self {
        Self {
            policy,
            speaking: None,
        }
    }

    pub fn on_speech_start(&mut self, status: CallStatus, context: &SpeakerContext<'_>) {
        if status != CallStatus::Active {
            self.speaking = None;
            return;
        }
        self.speaking = self
            .policy
            .pick_speaker(context)
            .filter(|id| context.panel.get(id).is_some());
        tracing::debug!("speaking panelist: {:?}", self.speaking);
    }

    pub fn on_speech_end(&mut self) {
        self.speaking = None;
    }

    /// Clears the speaker whenever the call is not live.
    pub fn on_status(&mut self, status: CallStatus) {
        if status != CallStatus::Active {
            self.speaking = None;
        }
    }

    pub fn speaking_person_id(&self) -> Option<&PanelistId> {
        self.speaking.as_ref()
    }

    pub fn is_speaking(&self, panelist: &Panelist) -> bool {
        self.speaking.as_ref() == Some(&panelist.id)
    }
}

/// The human side of the call. Muting is a user toggle and never feeds the
/// speaker coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub muted: bool,
}

impl Candidate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            muted: false,
        }
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }
}
