use std::path::Path;

use doccode::{PublicReference, domain::reference::DEFAULT_BASE_URL};
use tracing::instrument;

use crate::cli::{load_settings, settings_path, terminal::Colorize};

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Show current settings
    Show,

    /// Set a setting
    Set {
        /// Setting to change (public_base_url or digits)
        key: String,

        /// New value
        value: String,
    },

    /// Reset a setting to its default
    Unset {
        /// Setting to reset (public_base_url or digits)
        key: String,
    },
}

impl Command {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut settings = load_settings(root)?;

        match self {
            Self::Show => {
                println!("Settings:");
                match settings.public_base_url() {
                    Some(url) => println!("  public_base_url: {url}"),
                    None => println!(
                        "  public_base_url: {} {}",
                        DEFAULT_BASE_URL,
                        "(default)".dim()
                    ),
                }
                println!("  digits: {}", settings.digits());
                return Ok(());
            }
            Self::Set { key, value } => match key.as_str() {
                "public_base_url" => {
                    // Reject unusable URLs before they reach the settings file.
                    PublicReference::new(Some(&value))?;
                    settings.set_public_base_url(Some(value.clone()));
                    println!("{}", format!("Public base URL: {value}").success());
                }
                "digits" => {
                    let digits = value
                        .parse::<usize>()
                        .map_err(|_| anyhow::anyhow!("Value must be a positive integer"))?;
                    settings.set_digits(digits)?;
                    println!("{}", format!("Sequence digits: {digits}").success());
                }
                _ => anyhow::bail!("Unknown setting '{key}' (expected public_base_url or digits)"),
            },
            Self::Unset { key } => match key.as_str() {
                "public_base_url" => {
                    settings.set_public_base_url(None);
                    println!("{}", format!("Public base URL: {DEFAULT_BASE_URL}").success());
                }
                "digits" => {
                    let digits = doccode::Settings::default().digits();
                    settings.set_digits(digits)?;
                    println!("{}", format!("Sequence digits: {digits}").success());
                }
                _ => anyhow::bail!("Unknown setting '{key}' (expected public_base_url or digits)"),
            },
        }

        settings.save(&settings_path(root))?;
        Ok(())
    }
}
