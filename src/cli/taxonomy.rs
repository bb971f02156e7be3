use std::path::Path;

use doccode::{Category, Component, domain::SegmentCode};
use tracing::instrument;

use crate::cli::{open_store, terminal::Colorize};

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// List the components of one category, or of all categories
    List {
        /// The category to list (document-types, departments, sub-departments,
        /// languages or scopes)
        category: Option<Category>,
    },

    /// Add a component to a category
    Add {
        /// The category to add to
        category: Category,

        /// The code rendered into document codes
        code: SegmentCode,

        /// Human-readable label
        label: String,

        /// Optional longer description
        #[arg(long, short)]
        description: Option<String>,
    },

    /// Remove a component from a category
    ///
    /// Codes already issued with this component are left untouched.
    Remove {
        /// The category to remove from
        category: Category,

        /// The code of the component
        code: String,
    },

    /// Replace the label and description of a component
    Relabel {
        /// The category of the component
        category: Category,

        /// The code of the component
        code: String,

        /// The new label
        label: String,

        /// The new description; omitting it clears the old one
        #[arg(long, short)]
        description: Option<String>,
    },
}

impl Command {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let store = open_store(root)?;

        match self {
            Self::List { category } => {
                let taxonomy = store.taxonomy()?;
                let categories = category.map_or_else(|| Category::ALL.to_vec(), |c| vec![c]);
                for category in categories {
                    println!("{}", category.to_string().info());
                    let components = taxonomy.components(category);
                    if components.is_empty() {
                        println!("  {}", "(empty, any code accepted)".dim());
                    }
                    for component in components {
                        print_component(component);
                    }
                }
            }
            Self::Add {
                category,
                code,
                label,
                description,
            } => {
                let mut component = Component::new(code.clone(), label);
                if let Some(description) = description {
                    component = component.with_description(description);
                }
                store.add_component(category, component)?;
                println!("{}", format!("Added {code} to {category}").success());
            }
            Self::Remove { category, code } => {
                let removed = store.remove_component(category, &code)?;
                println!("{}", format!("Removed {} from {category}", removed.code).success());
            }
            Self::Relabel {
                category,
                code,
                label,
                description,
            } => {
                store.relabel_component(category, &code, label, description)?;
                println!("{}", format!("Relabelled {code} in {category}").success());
            }
        }
        Ok(())
    }
}

fn print_component(component: &Component) {
    match &component.description {
        Some(description) => println!(
            "  {:<12} {} {}",
            component.code.as_str(),
            component.label,
            format!("({description})").dim()
        ),
        None => println!("  {:<12} {}", component.code.as_str(), component.label),
    }
}
