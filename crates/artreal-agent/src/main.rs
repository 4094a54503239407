//! # artreal
//!
//! Command-line entry point: wires settings, logging, the session registry,
//! and the execution streamer, then prints every event as one JSON line.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use artreal_core::{ApiKey, ProjectId, SessionId};
use artreal_runtime::orchestrator::{DefaultOrchestratorFactory, RegistryConfig, SessionRegistry};
use artreal_runtime::streaming::{
    ExecutionStreamer, FileInteractionStore, StreamEvent, StreamRequest, StreamerConfig,
};
use artreal_runtime::{RunContext, Task};
use artreal_settings::ArtrealSettings;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

/// Planner/executor agent for project workspaces.
#[derive(Parser, Debug)]
#[command(name = "artreal", about = "Planner/executor agent for project workspaces")]
struct Cli {
    /// Settings file (defaults to `~/.artreal/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one task and stream its events.
    Run {
        /// Project id; the workspace is `<projectsDir>/project_<id>`.
        #[arg(long)]
        project: String,

        /// Skip planning and send the task straight to the executor.
        #[arg(long)]
        direct_edit: bool,

        /// Caller-scoped Gemini key used for this run only.
        #[arg(long)]
        api_key: Option<String>,

        /// Chat session id reported in the `start` event.
        #[arg(long)]
        session: Option<String>,

        /// Id of the message that started the run.
        #[arg(long)]
        message_id: Option<String>,

        /// The task.
        #[arg(required = true, num_args = 1..)]
        task: Vec<String>,
    },
    /// Print the saved conversation history of a project.
    History {
        /// Project id.
        #[arg(long)]
        project: String,
    },
}

fn load_settings(path: Option<&Path>) -> Result<ArtrealSettings> {
    let path = path.map_or_else(artreal_settings::settings_path, Path::to_path_buf);
    artreal_settings::load_settings_from_path(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))
}

/// Caller-scoped key for this run. Anything that is not a Gemini key is
/// ignored and the configured default applies.
fn parse_credential(raw: Option<&str>) -> Option<ApiKey> {
    let raw = raw?;
    let key = ApiKey::from_header(raw);
    if key.is_none() {
        tracing::warn!("--api-key is not a Gemini key, using the configured default");
    }
    key
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Cli::parse();
    let settings = load_settings(args.settings.as_deref())?;
    artreal_core::logging::init_subscriber(&settings.logging.level, settings.logging.json);

    let factory = Arc::new(DefaultOrchestratorFactory::new(settings.clone()));
    let registry = SessionRegistry::new(factory, RegistryConfig::from(&settings.registry));

    let result = match args.command {
        Command::Run {
            project,
            direct_edit,
            api_key,
            session,
            message_id,
            task,
        } => {
            let credential = parse_credential(api_key.as_deref());
            let request = StreamRequest {
                task: Task::new(task.join(" ")).with_direct_edit(direct_edit),
                session_id: session.map_or_else(SessionId::new, SessionId::from),
                user_message_id: message_id.unwrap_or_else(|| SessionId::new().to_string()),
            };
            run(&registry, &settings, ProjectId::from(project), request, credential).await
        }
        Command::History { project } => history(&registry, &ProjectId::from(project)).await,
    };

    registry.shutdown().await;
    result
}

async fn run(
    registry: &Arc<SessionRegistry>,
    settings: &ArtrealSettings,
    project_id: ProjectId,
    request: StreamRequest,
    credential: Option<ApiKey>,
) -> Result<ExitCode> {
    let orchestrator = registry
        .acquire(&project_id)
        .await
        .context("Failed to start session")?;
    let interactions = Arc::new(FileInteractionStore::new(
        PathBuf::from(&settings.storage.projects_dir).join(".interactions"),
    ));
    let streamer = ExecutionStreamer::new(
        orchestrator,
        interactions,
        StreamerConfig::from(&settings.streaming),
    );

    let cancellation = CancellationToken::new();
    let on_interrupt = cancellation.clone();
    let _signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling run");
            on_interrupt.cancel();
        }
    });

    let ctx = RunContext {
        cancellation,
        credential,
    };
    let mut events = streamer.stream(request, ctx);
    let mut failed = false;
    while let Some(event) = events.next().await {
        failed = matches!(event, StreamEvent::Error { .. });
        print_json(&event)?;
    }
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn history(registry: &Arc<SessionRegistry>, project_id: &ProjectId) -> Result<ExitCode> {
    let orchestrator = registry
        .acquire(project_id)
        .await
        .context("Failed to load session")?;
    for turn in orchestrator.history().await {
        print_json(&turn)?;
    }
    Ok(ExitCode::SUCCESS)
}
