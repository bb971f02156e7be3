//! The enumerated vocabularies used to validate and label code segments.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::{
    codification::{CodificationError, Field},
    segment::{InvalidSegmentError, SegmentCode},
};

/// One of the five taxonomy vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Document types, e.g. `PROC` for procedures.
    DocumentTypes,
    /// Departments, e.g. `QMS`.
    Departments,
    /// Sub-departments of a department.
    SubDepartments,
    /// Languages, e.g. `FR`, `EN`.
    Languages,
    /// Scopes, e.g. an airport such as `NBE`.
    Scopes,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 5] = [
        Self::DocumentTypes,
        Self::Departments,
        Self::SubDepartments,
        Self::Languages,
        Self::Scopes,
    ];

    /// The name used on the command line and in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DocumentTypes => "document-types",
            Self::Departments => "departments",
            Self::SubDepartments => "sub-departments",
            Self::Languages => "languages",
            Self::Scopes => "scopes",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = UnknownCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|category| category.name() == wanted)
            .ok_or_else(|| UnknownCategoryError(s.to_string()))
    }
}

/// Error returned when a category name is not recognised.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error(
    "unknown taxonomy category '{0}' (expected one of: document-types, departments, \
     sub-departments, languages, scopes)"
)]
pub struct UnknownCategoryError(String);

/// A single entry in a taxonomy vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// The code rendered into document codes.
    pub code: SegmentCode,
    /// Human-readable label.
    pub label: String,
    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Component {
    /// Creates a component without a description.
    pub fn new(code: SegmentCode, label: impl Into<String>) -> Self {
        Self {
            code,
            label: label.into(),
            description: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Errors raised by taxonomy administration.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum TaxonomyError {
    /// A component with the same code already exists in the category.
    #[error("{category} already contains '{code}'")]
    Duplicate {
        /// The category that was edited.
        category: Category,
        /// The duplicated code.
        code: String,
    },

    /// No component with this code exists in the category.
    #[error("{category} does not contain '{code}'")]
    NotFound {
        /// The category that was searched.
        category: Category,
        /// The missing code.
        code: String,
    },

    /// The supplied code is not a valid segment.
    #[error(transparent)]
    InvalidCode(#[from] InvalidSegmentError),

    /// The edit could not be persisted.
    #[error(transparent)]
    Store(#[from] crate::storage::StoreError),
}

/// The five ordered vocabularies.
///
/// Codes are unique within a category. Since [`SegmentCode`] normalises to
/// upper case, uniqueness is case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    document_types: Vec<Component>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    departments: Vec<Component>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sub_departments: Vec<Component>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    languages: Vec<Component>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    scopes: Vec<Component>,
}

impl Taxonomy {
    /// Returns the components of a category, in insertion order.
    #[must_use]
    pub fn components(&self, category: Category) -> &[Component] {
        match category {
            Category::DocumentTypes => &self.document_types,
            Category::Departments => &self.departments,
            Category::SubDepartments => &self.sub_departments,
            Category::Languages => &self.languages,
            Category::Scopes => &self.scopes,
        }
    }

    const fn components_mut(&mut self, category: Category) -> &mut Vec<Component> {
        match category {
            Category::DocumentTypes => &mut self.document_types,
            Category::Departments => &mut self.departments,
            Category::SubDepartments => &mut self.sub_departments,
            Category::Languages => &mut self.languages,
            Category::Scopes => &mut self.scopes,
        }
    }

    /// Finds a component by code, ignoring case.
    #[must_use]
    pub fn find(&self, category: Category, code: &str) -> Option<&Component> {
        self.components(category)
            .iter()
            .find(|component| component.code.eq_ignore_ascii_case(code.trim()))
    }

    /// Appends a component to a category.
    ///
    /// # Errors
    ///
    /// Returns [`TaxonomyError::Duplicate`] if the code is already present.
    pub fn add(&mut self, category: Category, component: Component) -> Result<(), TaxonomyError> {
        if self.find(category, &component.code).is_some() {
            return Err(TaxonomyError::Duplicate {
                category,
                code: component.code.to_string(),
            });
        }
        self.components_mut(category).push(component);
        Ok(())
    }

    /// Removes a component from a category and returns it.
    ///
    /// Codes already issued with this component are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`TaxonomyError::NotFound`] if no such component exists.
    pub fn remove(&mut self, category: Category, code: &str) -> Result<Component, TaxonomyError> {
        let components = self.components_mut(category);
        let position = components
            .iter()
            .position(|component| component.code.eq_ignore_ascii_case(code.trim()))
            .ok_or_else(|| TaxonomyError::NotFound {
                category,
                code: code.to_string(),
            })?;
        Ok(components.remove(position))
    }

    /// Replaces the label and description of a component, keeping its code.
    ///
    /// # Errors
    ///
    /// Returns [`TaxonomyError::NotFound`] if no such component exists.
    pub fn relabel(
        &mut self,
        category: Category,
        code: &str,
        label: String,
        description: Option<String>,
    ) -> Result<(), TaxonomyError> {
        let component = self
            .components_mut(category)
            .iter_mut()
            .find(|component| component.code.eq_ignore_ascii_case(code.trim()))
            .ok_or_else(|| TaxonomyError::NotFound {
                category,
                code: code.to_string(),
            })?;
        component.label = label;
        component.description = description;
        Ok(())
    }
}

/// Checks that `code` is listed in `components`.
///
/// An empty vocabulary accepts every code, so an unconfigured taxonomy does
/// not block codification.
pub(crate) fn ensure_listed(
    components: &[Component],
    field: Field,
    code: &str,
) -> Result<(), CodificationError> {
    if components.is_empty()
        || components
            .iter()
            .any(|component| component.code.eq_ignore_ascii_case(code))
    {
        Ok(())
    } else {
        Err(CodificationError::Unknown {
            field,
            code: code.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(code: &str, label: &str) -> Component {
        Component::new(SegmentCode::new(code).unwrap(), label)
    }

    #[test]
    fn add_keeps_insertion_order() {
        let mut taxonomy = Taxonomy::default();
        taxonomy
            .add(Category::Languages, component("FR", "Français"))
            .unwrap();
        taxonomy
            .add(Category::Languages, component("EN", "English"))
            .unwrap();

        let codes: Vec<_> = taxonomy
            .components(Category::Languages)
            .iter()
            .map(|c| c.code.as_str())
            .collect();
        assert_eq!(codes, ["FR", "EN"]);
        assert!(taxonomy.components(Category::Scopes).is_empty());
    }

    #[test]
    fn duplicate_codes_are_rejected_case_insensitively() {
        let mut taxonomy = Taxonomy::default();
        taxonomy
            .add(Category::Departments, component("QMS", "Quality"))
            .unwrap();

        let error = taxonomy
            .add(Category::Departments, component("qms", "Quality again"))
            .unwrap_err();
        assert_eq!(
            error,
            TaxonomyError::Duplicate {
                category: Category::Departments,
                code: "QMS".to_string()
            }
        );

        // The same code may exist in another category
        taxonomy
            .add(Category::SubDepartments, component("QMS", "Quality cell"))
            .unwrap();
    }

    #[test]
    fn remove_and_relabel() {
        let mut taxonomy = Taxonomy::default();
        taxonomy
            .add(Category::Scopes, component("NBE", "Enfidha"))
            .unwrap();
        taxonomy
            .add(Category::Scopes, component("MIR", "Monastir"))
            .unwrap();

        taxonomy
            .relabel(
                Category::Scopes,
                "nbe",
                "Enfidha-Hammamet".to_string(),
                Some("Main hub".to_string()),
            )
            .unwrap();
        let nbe = taxonomy.find(Category::Scopes, "NBE").unwrap();
        assert_eq!(nbe.label, "Enfidha-Hammamet");
        assert_eq!(nbe.description.as_deref(), Some("Main hub"));

        let removed = taxonomy.remove(Category::Scopes, "mir").unwrap();
        assert_eq!(removed.code.as_str(), "MIR");
        assert!(matches!(
            taxonomy.remove(Category::Scopes, "MIR"),
            Err(TaxonomyError::NotFound { .. })
        ));
    }

    #[test]
    fn empty_category_accepts_anything() {
        assert!(ensure_listed(&[], Field::Department, "ANY").is_ok());
    }

    #[test]
    fn unlisted_code_is_unknown() {
        let components = [component("QMS", "Quality")];
        assert!(ensure_listed(&components, Field::Department, "QMS").is_ok());
        assert_eq!(
            ensure_listed(&components, Field::Department, "OPS"),
            Err(CodificationError::Unknown {
                field: Field::Department,
                code: "OPS".to_string()
            })
        );
    }

    #[test]
    fn category_names_parse() {
        for category in Category::ALL {
            assert_eq!(category.name().parse::<Category>(), Ok(category));
        }
        assert_eq!(
            "SUB_DEPARTMENTS".parse::<Category>(),
            Ok(Category::SubDepartments)
        );
        assert!("airports".parse::<Category>().is_err());
    }
}
