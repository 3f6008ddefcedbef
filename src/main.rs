//! unicommit - CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use dialoguer::Confirm;
use tracing::error;

use unicommit::commit::{CommitService, Progress, TerminalProgress};
use unicommit::config::FileConfigSource;
use unicommit::git::{GitCommitSink, GitRepository, MessageFileSink, MessageSink, StdoutSink};
use unicommit::llm::{ProviderFactory, ProviderKind};
use unicommit::logging::{self, LogSink};
use unicommit::secrets::{FileSecretStore, SecretStore, TerminalPrompt, clear_secrets, secret_status};

/// Generate git commit messages with the LLM provider of your choice.
#[derive(Parser, Debug)]
#[command(name = "unicommit")]
#[command(about = "Generate git commit messages with the LLM provider of your choice")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Config file (defaults to ~/.config/unicommit/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase stderr log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a commit message for pending changes (default)
    Generate(GenerateArgs),

    /// Manage stored API keys
    Secrets {
        #[command(subcommand)]
        action: SecretsAction,
    },
}

#[derive(Args, Debug, Default)]
struct GenerateArgs {
    /// Create a commit with the generated message
    #[arg(long, conflicts_with = "message_file")]
    commit: bool,

    /// Write the message into this file (e.g. from a prepare-commit-msg hook)
    #[arg(long, value_name = "PATH")]
    message_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum SecretsAction {
    /// Show which providers have a stored API key
    Status,

    /// Delete every stored API key
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Delete the stored API key of one provider
    Delete {
        /// Provider identifier (openai, anthropic, gemini, ...)
        provider: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log = match logging::default_log_path().map(|path| LogSink::open(path, cli.verbose)) {
        Some(Ok(sink)) => Some(sink),
        Some(Err(e)) => {
            logging::init_stderr_only(cli.verbose);
            eprintln!("Warning: could not open log file: {e}");
            None
        }
        None => {
            logging::init_stderr_only(cli.verbose);
            None
        }
    };

    let result = run(cli).await;

    let code = match &result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:?}");
            eprintln!("Error: {e:#}");
            if let Some(log) = &log {
                eprintln!("Full log: {}", log.path().display());
            }
            ExitCode::FAILURE
        }
    };

    if let Some(log) = log
        && let Err(e) = log.close()
    {
        eprintln!("Warning: could not flush log file: {e}");
    }
    code
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Secrets { action }) => run_secrets(action).await,
        Some(Command::Generate(args)) => run_generate(cli.config, args).await,
        None => run_generate(cli.config, GenerateArgs::default()).await,
    }
}

async fn run_generate(config: Option<PathBuf>, args: GenerateArgs) -> Result<()> {
    let config = FileConfigSource::discover(config).context("Failed to locate config file")?;
    let store = FileSecretStore::default_location().context("Failed to locate secret store")?;
    let workspace = GitRepository::discover(".")
        .context("Not a git repository. Run unicommit from within a git repository.")?;

    let applies_elsewhere = args.commit || args.message_file.is_some();
    let sink: Arc<dyn MessageSink> = if args.commit {
        Arc::new(GitCommitSink::new(workspace.root()))
    } else if let Some(path) = args.message_file {
        Arc::new(MessageFileSink::new(path))
    } else {
        Arc::new(StdoutSink)
    };

    let progress = Arc::new(TerminalProgress::new());
    let prompt = TerminalPrompt::with_progress_bar(progress.bar());
    let factory = ProviderFactory::new(Arc::new(store), Arc::new(prompt));

    let service = CommitService::new(Arc::new(config), Arc::new(workspace), Arc::new(factory), sink)
        .with_progress(progress.clone());

    let result = service.generate_and_apply().await;
    progress.finish();
    let message = result?;

    if applies_elsewhere {
        let subject = message.as_str().lines().next().unwrap_or_default();
        eprintln!("✓ {subject}");
    }
    Ok(())
}

async fn run_secrets(action: SecretsAction) -> Result<()> {
    let store = FileSecretStore::default_location().context("Failed to locate secret store")?;

    match action {
        SecretsAction::Status => {
            println!("Secret store: {}", store.path().display());
            for status in secret_status(&store).await? {
                let state = if status.stored { "stored" } else { "not set" };
                println!("  {:<12} {}", status.provider.as_str(), state);
            }
        }
        SecretsAction::Clear { yes } => {
            let confirmed = yes
                || Confirm::new()
                    .with_prompt("Delete all stored API keys?")
                    .default(false)
                    .interact()
                    .context("Confirmation prompt failed")?;
            if !confirmed {
                println!("Nothing deleted.");
                return Ok(());
            }
            let cleared = clear_secrets(&store).await?;
            println!("✓ Cleared {cleared} stored API key(s)");
        }
        SecretsAction::Delete { provider } => {
            let Some(kind) = ProviderKind::from_id(&provider) else {
                bail!("Unknown provider: {provider}");
            };
            if kind.is_local() {
                bail!("{kind} does not use an API key");
            }
            store.delete(&kind.secret_key()).await?;
            println!("✓ Deleted {kind} API key");
        }
    }
    Ok(())
}
