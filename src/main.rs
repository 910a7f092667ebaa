use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use postergen_lib::config::Settings;
use postergen_lib::view::TerminalView;
use postergen_lib::{
    DownloadBridge, FestivalPoster, FileSaver, HttpGenerationClient, Menu, PromotionalPoster,
    Workflow, WorkflowController, WorkflowState,
};

#[derive(Parser)]
#[command(name = "postergen", version, about = "Generate posters and menus")]
struct Cli {
    /// Generator base URL
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Promotional poster
    Poster(FormArgs),
    /// Festival greeting poster
    Festival(FormArgs),
    /// Restaurant menu
    Menu(FormArgs),
    /// Read or change stored settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args)]
struct FormArgs {
    /// JSON file with the form fields
    form: PathBuf,

    /// Save the generated image into the download directory
    #[arg(long)]
    download: bool,
}

#[derive(Subcommand)]
enum ConfigAction {
    Set { key: String, value: String },
    Get { key: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "postergen=info,postergen_lib=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings_path = Settings::default_path();
    let mut settings = Settings::load_from(&settings_path)?;

    match cli.command {
        Command::Config { action } => match action {
            ConfigAction::Set { key, value } => {
                settings.set(&key, &value)?;
                settings.save_to(&settings_path)?;
                tracing::info!(%key, path = %settings_path.display(), "setting saved");
            }
            ConfigAction::Get { key } => {
                println!("{}", settings.get(&key)?.unwrap_or_default());
            }
        },
        Command::Poster(args) => {
            let base = settings.server_url(cli.server.as_deref())?;
            return run::<PromotionalPoster>(&args, base, &settings).await;
        }
        Command::Festival(args) => {
            let base = settings.server_url(cli.server.as_deref())?;
            return run::<FestivalPoster>(&args, base, &settings).await;
        }
        Command::Menu(args) => {
            let base = settings.server_url(cli.server.as_deref())?;
            return run::<Menu>(&args, base, &settings).await;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn read_form<F: DeserializeOwned>(path: &Path) -> Result<F> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read form {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid form {}", path.display()))
}

/// Whether a finished submission succeeded. Failures were already shown to
/// the user by the view.
fn succeeded(state: &WorkflowState) -> Result<bool> {
    match state {
        WorkflowState::Succeeded(_) => Ok(true),
        WorkflowState::Failed(_) => Ok(false),
        state => bail!("Submission ended in unexpected state {:?}", state),
    }
}

async fn run<W>(args: &FormArgs, base: Url, settings: &Settings) -> Result<ExitCode>
where
    W: Workflow,
    W::Form: DeserializeOwned,
{
    let form: W::Form = read_form(&args.form)?;
    let client = HttpGenerationClient::new(base.clone());
    let mut controller: WorkflowController<W, _, _> =
        WorkflowController::new(TerminalView::new(W::IDLE_LABEL), client, DownloadBridge::new());

    if !succeeded(controller.submit(&form).await)? {
        return Ok(ExitCode::FAILURE);
    }

    if args.download {
        if let Some(action) = controller.download().trigger() {
            let saver = FileSaver::new(base, settings.download_dir());
            let path = saver.save(&action).await?;
            println!("Saved {}", path.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}
