use std::path::{Path, PathBuf};

mod counters;
mod generate;
mod reference;
mod settings;
mod taxonomy;
mod terminal;

use clap::ArgAction;
use doccode::{FileStore, Settings};
use tracing::instrument;

/// Directory holding the operator state under the root.
const STATE_DIR: &str = ".doccode";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The directory containing the `.doccode` state directory
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);
        self.command.run(&self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Initialize the registry in the root directory
    Init,

    /// Issue a new document code
    Generate(generate::Generate),

    /// Re-run codification for an entity whose fields changed
    ///
    /// Prints the existing code when nothing changed, otherwise issues a new
    /// one. The previous code's number is not reused.
    Recodify(generate::Recodify),

    /// Print the public reference URL of an entity
    Reference(reference::Command),

    /// Administer the taxonomy vocabularies
    #[command(subcommand)]
    Taxonomy(taxonomy::Command),

    /// Show the current value of every sequence counter
    Counters(counters::Command),

    /// Show or modify settings
    #[command(subcommand)]
    Settings(settings::Command),
}

impl Command {
    fn run(self, root: &Path) -> anyhow::Result<()> {
        match self {
            Self::Init => init(root)?,
            Self::Generate(command) => command.run(root)?,
            Self::Recodify(command) => command.run(root)?,
            Self::Reference(command) => command.run(root)?,
            Self::Taxonomy(command) => command.run(root)?,
            Self::Counters(command) => command.run(root)?,
            Self::Settings(command) => command.run(root)?,
        }
        Ok(())
    }
}

#[instrument]
fn init(root: &Path) -> anyhow::Result<()> {
    use terminal::Colorize;

    let state_dir = root.join(STATE_DIR);
    if state_dir.exists() {
        anyhow::bail!("Registry already initialized (found existing {STATE_DIR} directory)");
    }

    std::fs::create_dir_all(&state_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create {STATE_DIR} directory: {e}"))?;

    Settings::default()
        .save(&settings_path(root))
        .map_err(|e| anyhow::anyhow!("Failed to create settings.toml: {e}"))?;

    println!(
        "{}",
        format!("Initialized document code registry in {}", root.display()).success()
    );
    println!("  Created: {STATE_DIR}/settings.toml");
    println!();
    println!("Next steps:");
    println!("  codify taxonomy add departments QMS \"Quality Management\"");
    println!("  codify generate --company TAVTUN --scope NBE --department QMS --kind pv --language FR");
    Ok(())
}

fn settings_path(root: &Path) -> PathBuf {
    root.join(STATE_DIR).join("settings.toml")
}

fn registry_path(root: &Path) -> PathBuf {
    root.join(STATE_DIR).join("registry.toml")
}

fn ensure_initialized(root: &Path) -> anyhow::Result<()> {
    if !root.join(STATE_DIR).is_dir() {
        anyhow::bail!("Registry not initialized. Run 'codify init' first");
    }
    Ok(())
}

/// Loads the settings, falling back to defaults when none are saved.
fn load_settings(root: &Path) -> anyhow::Result<Settings> {
    ensure_initialized(root)?;
    let path = settings_path(root);
    if !path.exists() {
        tracing::debug!("No settings at {}, using defaults", path.display());
        return Ok(Settings::default());
    }
    Ok(Settings::load(&path)?)
}

fn open_store(root: &Path) -> anyhow::Result<FileStore> {
    ensure_initialized(root)?;
    Ok(FileStore::open_file(registry_path(root))?)
}
