use std::path::Path;

use doccode::{
    CodeGenerator, CodificationRequest, Direction, DocumentCode, GeneratedCode, PublicReference,
    Recodification, RequestedKind, Settings, domain::Codification,
};
use tracing::instrument;

use crate::cli::{load_settings, open_store, terminal::Colorize};

/// Entity kinds accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum Kind {
    Document,
    Correspondence,
    #[value(alias = "pv")]
    ProcesVerbal,
}

/// The codification fields of an entity.
#[derive(Debug, clap::Args)]
pub struct CodificationArgs {
    /// Company code (e.g. TAVTUN)
    #[arg(long)]
    company: String,

    /// Scope code (e.g. NBE)
    #[arg(long)]
    scope: String,

    /// Department code (e.g. QMS)
    #[arg(long)]
    department: String,

    /// Sub-department code; omitted codes render as NA
    #[arg(long)]
    sub_department: Option<String>,

    /// The kind of entity being codified
    #[arg(long, value_enum)]
    kind: Kind,

    /// Document type code (documents only)
    #[arg(long = "type")]
    type_code: Option<String>,

    /// IN or OUT (correspondence only)
    #[arg(long)]
    direction: Option<Direction>,

    /// Language code (e.g. FR)
    #[arg(long)]
    language: String,

    /// Entity id; when given, the public reference is printed too
    #[arg(long)]
    id: Option<String>,
}

impl CodificationArgs {
    fn to_request(&self) -> anyhow::Result<CodificationRequest> {
        let kind = match (self.kind, &self.type_code, self.direction) {
            (Kind::Document, Some(type_code), _) => RequestedKind::Document {
                type_code: type_code.clone(),
            },
            (Kind::Document, None, _) => anyhow::bail!("--type is required for documents"),
            (Kind::Correspondence, _, Some(direction)) => {
                RequestedKind::Correspondence { direction }
            }
            (Kind::Correspondence, _, None) => {
                anyhow::bail!("--direction is required for correspondence")
            }
            (Kind::ProcesVerbal, ..) => RequestedKind::ProcesVerbal,
        };

        let mut request = CodificationRequest::new(
            &self.company,
            &self.scope,
            &self.department,
            kind,
            &self.language,
        );
        if let Some(sub_department) = &self.sub_department {
            request = request.with_sub_department(sub_department);
        }
        Ok(request)
    }
}

#[derive(Debug, clap::Parser)]
pub struct Generate {
    #[command(flatten)]
    codification: CodificationArgs,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

impl Generate {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let settings = load_settings(root)?;
        let store = open_store(root)?;
        let generator = CodeGenerator::with_settings(&store, &settings);

        let request = self.codification.to_request()?;
        let reference = public_reference(&request, self.codification.id.as_deref(), &settings)?;
        let generated = generator.generate_code(&request)?;

        print_issued(&generated, reference.as_deref(), self.json)
    }
}

#[derive(Debug, clap::Parser)]
pub struct Recodify {
    /// The code currently held by the entity
    previous: DocumentCode,

    #[command(flatten)]
    codification: CodificationArgs,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

impl Recodify {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let settings = load_settings(root)?;
        let store = open_store(root)?;
        let generator = CodeGenerator::with_settings(&store, &settings);

        let request = self.codification.to_request()?;
        let reference = public_reference(&request, self.codification.id.as_deref(), &settings)?;

        match generator.recodify(&self.previous, &request)? {
            Recodification::Unchanged => {
                let code = self.previous.display(settings.digits()).to_string();
                if self.json {
                    let output = serde_json::json!({
                        "changed": false,
                        "code": code,
                        "reference": reference,
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    println!("{}", format!("Unchanged, keeping {code}").dim());
                    if let Some(reference) = reference {
                        println!("{}", reference.info());
                    }
                }
                Ok(())
            }
            Recodification::Reissued(generated) => {
                print_issued(&generated, reference.as_deref(), self.json)
            }
        }
    }
}

/// The entity's public reference, if an id was given.
///
/// Runs before any number is issued, so an unusable base URL fails the
/// command without consuming a sequence number.
fn public_reference(
    request: &CodificationRequest,
    id: Option<&str>,
    settings: &Settings,
) -> anyhow::Result<Option<String>> {
    let references = PublicReference::new(settings.public_base_url())?;
    let Some(id) = id else {
        return Ok(None);
    };
    let kind = Codification::from_request(request)?.kind().name();
    Ok(Some(references.reference(kind, id).into()))
}

fn print_issued(
    generated: &GeneratedCode,
    reference: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        let mut output = serde_json::to_value(generated)?;
        if let (Some(reference), Some(object)) = (reference, output.as_object_mut()) {
            object.insert("reference".to_string(), reference.into());
        }
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", generated.code.issued());
    if let Some(reference) = reference {
        println!("{}", reference.info());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use doccode::FileStore;
    use tempfile::TempDir;

    use super::*;
    use crate::cli::{init, registry_path, settings_path};

    const MINUTES: [&str; 11] = [
        "generate",
        "--company",
        "TAVTUN",
        "--scope",
        "NBE",
        "--department",
        "QMS",
        "--kind",
        "pv",
        "--language",
        "FR",
    ];

    fn initialised() -> TempDir {
        let tmp = TempDir::new().unwrap();
        init(tmp.path()).unwrap();
        tmp
    }

    fn issued(root: &Path) -> Vec<(String, u64)> {
        FileStore::open_file(registry_path(root))
            .unwrap()
            .counters()
            .unwrap()
    }

    #[test]
    fn generate_advances_the_counter() {
        let tmp = initialised();

        Generate::try_parse_from(MINUTES).unwrap().run(tmp.path()).unwrap();
        Generate::try_parse_from(MINUTES).unwrap().run(tmp.path()).unwrap();

        assert_eq!(
            issued(tmp.path()),
            vec![("TAVTUN-NBE-QMS-NA-PV-FR".to_string(), 2)]
        );
    }

    #[test]
    fn unusable_base_url_fails_before_issuing() {
        let tmp = initialised();
        let mut settings = Settings::default();
        settings.set_public_base_url(Some("mailto:qms@example.tn".to_string()));
        settings.save(&settings_path(tmp.path())).unwrap();

        let command = Generate::try_parse_from(MINUTES.into_iter().chain(["--id", "42"])).unwrap();
        assert!(command.run(tmp.path()).is_err());
        assert!(issued(tmp.path()).is_empty());
    }

    #[test]
    fn document_requires_a_type() {
        let args = [
            "generate",
            "--company",
            "TAVTUN",
            "--scope",
            "NBE",
            "--department",
            "QMS",
            "--kind",
            "document",
            "--language",
            "FR",
        ];
        let command = Generate::try_parse_from(args).unwrap();
        assert!(command.codification.to_request().is_err());
    }
}
