use anyhow::Result;
use clap::{Parser, Subcommand};
use pitkit::mods::{Prompter, ScriptedPrompter, TerminalPrompter};
use pitkit::{App, Config};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pitkit")]
#[command(author, version, about = "A mod installer for MX Bikes")]
struct Cli {
    /// Answer install questions from --answer instead of the terminal
    #[arg(short, long)]
    batch: bool,

    /// Scripted answer for --batch, consumed in order ("-" cancels)
    #[arg(long = "answer", value_name = "ANSWER")]
    answers: Vec<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Mods folder override for this invocation
    #[arg(long)]
    mods_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a mod from an archive, folder, or .pkz/.pnt file
    Install {
        path: String,
        /// Display name (asked for when omitted)
        #[arg(long)]
        name: Option<String>,
    },

    /// Remove everything a mod installed
    Uninstall { name: String },

    /// List installed mods
    List,

    /// Show mod info and the files it owns
    Info { name: String },

    /// Rename an installed mod
    Rename { old_name: String, new_name: String },

    /// Show current status
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show configuration
    Show,
    /// Set the MX Bikes install folder
    SetGameDir { path: String },
    /// Override the mods folder
    SetModsDir { path: String },
    /// Use the mods folder configured in the game again
    ClearModsDir,
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "pitkit=info",
        1 => "pitkit=debug",
        2 => "pitkit=trace",
        _ => "trace",
    };

    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());
    let log_dir = std::env::var_os("HOME")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".pitkit");
    std::fs::create_dir_all(&log_dir).ok();

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("pitkit.log"));

    match file {
        Ok(file) => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
        Err(e) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .init();
            tracing::warn!("Log file unavailable, logging to stderr only: {}", e);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut config = Config::load().await?;
    if let Some(mods_dir) = cli.mods_dir.as_deref() {
        let trimmed = mods_dir.trim();
        if trimmed.is_empty() {
            anyhow::bail!("--mods-dir cannot be empty");
        }
        config.runtime_mods_dir = Some(trimmed.into());
    }

    if !cli.batch && !cli.answers.is_empty() {
        anyhow::bail!("--answer requires --batch");
    }
    let prompter: Arc<dyn Prompter> = if cli.batch {
        Arc::new(ScriptedPrompter::new(cli.answers))
    } else {
        Arc::new(TerminalPrompter::new())
    };

    let app = App::new(config, prompter, cli.batch).await?;

    match cli.command {
        Commands::Install { path, name } => app.cmd_install(&path, name.as_deref()).await?,
        Commands::Uninstall { name } => app.cmd_uninstall(&name).await?,
        Commands::List => app.cmd_list().await?,
        Commands::Info { name } => app.cmd_info(&name).await?,
        Commands::Rename { old_name, new_name } => app.cmd_rename(&old_name, &new_name).await?,
        Commands::Status => app.cmd_status().await?,
        Commands::Config { action } => match action {
            ConfigCommands::Show => app.cmd_config_show().await?,
            ConfigCommands::SetGameDir { path } => app.cmd_set_game_dir(&path).await?,
            ConfigCommands::SetModsDir { path } => app.cmd_set_mods_dir(&path).await?,
            ConfigCommands::ClearModsDir => app.cmd_set_mods_dir("").await?,
        },
    }

    Ok(())
}
