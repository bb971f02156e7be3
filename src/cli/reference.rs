use std::path::Path;

use doccode::PublicReference;
use tracing::instrument;

use crate::cli::load_settings;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The entity kind (e.g. document, correspondence, proces_verbal)
    kind: String,

    /// The entity id
    id: String,
}

impl Command {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let settings = load_settings(root)?;
        let references = PublicReference::new(settings.public_base_url())?;
        println!("{}", references.reference(&self.kind, &self.id));
        Ok(())
    }
}
