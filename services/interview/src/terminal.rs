use interview_core::navigation::{Navigator, Route};
use interview_core::panel::Panel;
use interview_core::session::{CallHandle, CallStatus, SessionSnapshot};
use interview_core::transcript::Role;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

pub const HELP: &str = "commands: start | end | mute | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalCommand {
    Start,
    EndCall,
    ToggleMute,
    Quit,
    Help,
}

impl std::str::FromStr for TerminalCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "start" | "s" => Ok(TerminalCommand::Start),
            "end" | "e" | "hangup" => Ok(TerminalCommand::EndCall),
            "mute" | "m" => Ok(TerminalCommand::ToggleMute),
            "quit" | "q" | "exit" => Ok(TerminalCommand::Quit),
            "help" | "h" | "?" => Ok(TerminalCommand::Help),
            other => Err(format!("unknown command '{other}'")),
        }
    }
}

/// Prints where the session would take the user next.
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn go_to(&self, route: &Route) {
        match route {
            Route::Home => println!("-> back to the dashboard ({})", route.path()),
            Route::Feedback { feedback_id, .. } => {
                println!("-> feedback {} is ready at {}", feedback_id, route.path())
            }
        }
    }
}

/// Feeds stdin lines into the session until the user quits or stdin closes.
pub async fn read_commands(handle: CallHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Failed to read from stdin: {:?}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let accepted = match line.parse::<TerminalCommand>() {
            Ok(TerminalCommand::Start) => handle.start(),
            Ok(TerminalCommand::EndCall) => handle.end_call(),
            Ok(TerminalCommand::ToggleMute) => handle.toggle_mute(),
            Ok(TerminalCommand::Quit) => {
                handle.exit();
                break;
            }
            Ok(TerminalCommand::Help) => {
                println!("{HELP}");
                true
            }
            Err(e) => {
                println!("{e}. {HELP}");
                true
            }
        };
        if !accepted {
            break;
        }
    }
}

/// Renders snapshot changes until the session closes.
pub async fn render(mut state: watch::Receiver<SessionSnapshot>, panel: Panel) {
    let mut last = state.borrow_and_update().clone();
    while state.changed().await.is_ok() {
        let current = state.borrow_and_update().clone();
        for line in describe_changes(&last, &current, &panel) {
            println!("{line}");
        }
        last = current;
    }
}

pub fn describe_panel(panel: &Panel) -> Vec<String> {
    panel
        .panelists()
        .iter()
        .map(|p| format!("  {} ({}, {:?})", p.name, p.title, p.role))
        .collect()
}

/// Human readable lines for what changed between two snapshots. Snapshots
/// coalesce, so only the latest transcript message is ever shown.
pub fn describe_changes(
    previous: &SessionSnapshot,
    current: &SessionSnapshot,
    panel: &Panel,
) -> Vec<String> {
    let mut lines = Vec::new();

    if previous.status != current.status {
        lines.push(match current.status {
            CallStatus::Inactive => match &current.last_error {
                Some(error) => format!("[call] not connected: {error}"),
                None => "[call] not connected".to_string(),
            },
            CallStatus::Connecting => "[call] connecting...".to_string(),
            CallStatus::Active => "[call] live".to_string(),
            CallStatus::Finished => "[call] ended".to_string(),
        });
    }
    if previous.current_question_index != current.current_question_index
        && current.total_questions > 0
    {
        lines.push(format!(
            "[progress] question {}/{} ({:?})",
            current.current_question_index, current.total_questions, current.question_type
        ));
    }
    if current.message_count > previous.message_count {
        if let Some(message) = &current.latest_message {
            let who = match message.role {
                Role::Candidate => "you",
                Role::Panelist => "panel",
                Role::System => "system",
            };
            lines.push(format!("{who}: {}", message.content));
        }
    }
    if previous.speaking_person_id != current.speaking_person_id {
        if let Some(panelist) = current
            .speaking_person_id
            .as_ref()
            .and_then(|id| panel.get(id))
        {
            lines.push(format!("[speaking] {}", panelist.name));
        }
    }
    if previous.candidate_muted != current.candidate_muted {
        lines.push(if current.candidate_muted {
            "[mic] muted".to_string()
        } else {
            "[mic] live".to_string()
        });
    }
    if !previous.is_generating_feedback && current.is_generating_feedback {
        lines.push("[feedback] generating feedback...".to_string());
    }
    if previous.last_error != current.last_error && current.status != CallStatus::Inactive {
        if let Some(error) = &current.last_error {
            lines.push(format!("[error] {error}"));
        }
    }

    lines
}
