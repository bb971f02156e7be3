use std::path::Path;

use tracing::instrument;

use crate::cli::{open_store, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Only show counters whose key starts with this prefix (e.g. TAVTUN-NBE)
    prefix: Option<String>,

    /// Print the counters as JSON
    #[arg(long)]
    json: bool,
}

impl Command {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let store = open_store(root)?;
        let prefix = self.prefix.as_deref().map(str::to_ascii_uppercase);

        let counters: Vec<(String, u64)> = store
            .counters()?
            .into_iter()
            .filter(|(key, _)| prefix.as_deref().is_none_or(|prefix| key.starts_with(prefix)))
            .collect();

        if self.json {
            let output: serde_json::Map<String, serde_json::Value> = counters
                .into_iter()
                .map(|(key, value)| (key, value.into()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        if counters.is_empty() {
            println!("{}", "No codes issued yet".dim());
        }
        for (key, value) in counters {
            println!("{key:<40} {value}");
        }
        Ok(())
    }
}
