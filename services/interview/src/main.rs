use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use interview_core::feedback::FeedbackClient;
use interview_core::panel::{InterviewType, RandomSpeakerPolicy};
use interview_core::session::{CallController, CallDeps, SessionConfig};
use interview_service::config::Config;
use interview_service::gateway_adapter::GatewayAdapter;
use interview_service::question_loader;
use interview_service::terminal::{self, TerminalNavigator};
use secrecy::ExposeSecret;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "Runs a live mock interview over the voice gateway")]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Take a scripted interview and get it evaluated afterwards
    Interview {
        /// Text or markdown file with one question per line
        #[arg(long)]
        questions: PathBuf,
        #[arg(long)]
        interview_id: String,
        #[arg(long)]
        user_id: String,
        #[arg(long, default_value = "Candidate")]
        user_name: String,
        #[arg(long, default_value = "Software Engineer")]
        role: String,
        #[arg(long, default_value = "mixed")]
        interview_type: InterviewType,
        /// Overwrite an earlier evaluation of this interview
        #[arg(long)]
        feedback_id: Option<String>,
    },
    /// Talk to the question generation workflow
    Generate {
        #[arg(long)]
        user_id: String,
        #[arg(long, default_value = "Candidate")]
        user_name: String,
    },
}

fn session_config(config: &Config, mode: Mode) -> Result<SessionConfig> {
    let session = match mode {
        Mode::Interview {
            questions,
            interview_id,
            user_id,
            user_name,
            role,
            interview_type,
            feedback_id,
        } => {
            let questions = question_loader::load_questions(&questions)
                .context("Failed to load interview questions")?;
            tracing::info!("Loaded {} questions successfully.", questions.len());

            let mut session = SessionConfig::interview(
                &interview_id,
                &user_id,
                config.require_assistant_id()?,
                questions,
            )
            .with_user_name(&user_name)
            .with_job_role(&role)
            .with_interview_type(interview_type);
            if let Some(feedback_id) = feedback_id {
                session = session.with_feedback_id(&feedback_id);
            }
            session
        }
        Mode::Generate { user_id, user_name } => {
            SessionConfig::generate(&user_id, &user_name, config.require_workflow_id()?)
        }
    };

    Ok(session
        .with_question_advance_delay(config.question_advance_delay)
        .with_feedback_display_delay(config.feedback_display_delay))
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    tracing::info!("Configuration loaded successfully. Starting interview service...");

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();
    let session_config = session_config(&config, args.mode)?;

    // --- 4. Connect Collaborators ---
    let mut gateway = voice_call::Config::builder().with_api_key(config.api_key.expose_secret());
    if let Some(url) = &config.gateway_url {
        gateway = gateway.with_base_url(url);
    }
    let provider = Arc::new(GatewayAdapter::connect(gateway.build()).await?);
    let feedback = Arc::new(FeedbackClient::new(
        &config.feedback_api_url,
        config.feedback_api_key.clone(),
    ));

    let deps = CallDeps {
        provider,
        feedback,
        navigator: Arc::new(TerminalNavigator),
        speaker_policy: Box::new(RandomSpeakerPolicy::new()),
    };
    let (controller, handle) = CallController::new(session_config, deps);

    println!("Your panel today:");
    for line in terminal::describe_panel(handle.panel()) {
        println!("{line}");
    }
    println!("{}", terminal::HELP);

    // --- 5. Run the Session ---
    let mut session = tokio::spawn(controller.run());
    tokio::spawn(terminal::render(handle.watch(), handle.panel().clone()));
    tokio::spawn(terminal::read_commands(handle.clone()));

    let finished = tokio::select! {
        finished = &mut session => finished,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down...");
            handle.exit();
            session.await
        }
    };

    match finished.context("Interview session task failed")? {
        Some(route) => tracing::info!("Session ended, next stop {}", route.path()),
        None => tracing::info!("Session closed without navigating"),
    }
    tracing::info!("Shutting down...");
    Ok(())
}
