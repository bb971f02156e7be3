//! Codification requests and their validated form.
//!
//! A [`CodificationRequest`] is what an entity-creation handler receives: raw
//! strings straight from a form. [`Codification::from_request`] checks the
//! syntax of every dimension and produces the typed [`Codification`] from which
//! the [`SequenceKey`] and the final code are derived. Checking the dimensions
//! against the taxonomy is the generator's job, since it needs the store.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::{
    segment::{InvalidSegmentError, SegmentCode},
    taxonomy::Category,
};

/// Delimiter between the segments of a code and of a sequence key.
pub const DELIMITER: char = '-';

/// Sequence-key token standing in for an absent sub-department.
pub const NO_SUB_DEPARTMENT: &str = "NA";

/// Type segment used for every meeting-minutes record.
pub const PROCES_VERBAL_TYPE: &str = "PV";

/// Direction of a correspondence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Incoming mail (`IN`).
    In,
    /// Outgoing mail (`OUT`).
    Out,
}

impl Direction {
    /// The type segment rendered for this direction.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Direction {
    type Err = CodificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(Self::In),
            "OUT" => Ok(Self::Out),
            "" => Err(CodificationError::Missing(Field::Type)),
            _ => Err(CodificationError::Malformed {
                field: Field::Type,
                value: s.to_string(),
            }),
        }
    }
}

/// The kind of entity being codified, carrying what its type segment means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    /// A controlled document, typed by a document-type code from the taxonomy.
    Document {
        /// The document-type code.
        type_code: SegmentCode,
    },
    /// A piece of correspondence, typed by its direction.
    Correspondence {
        /// Incoming or outgoing.
        direction: Direction,
    },
    /// Meeting minutes; the type segment is always `PV`.
    ProcesVerbal,
}

impl EntityKind {
    /// The type segment rendered in the code for this entity.
    #[must_use]
    pub fn type_code(&self) -> &str {
        match self {
            Self::Document { type_code } => type_code.as_str(),
            Self::Correspondence { direction } => direction.code(),
            Self::ProcesVerbal => PROCES_VERBAL_TYPE,
        }
    }

    /// Lower-case name of the kind, as used in public references.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Document { .. } => "document",
            Self::Correspondence { .. } => "correspondence",
            Self::ProcesVerbal => "proces_verbal",
        }
    }
}

/// The entity kind as it arrives in a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity_kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestedKind {
    /// A document with its raw document-type code.
    Document {
        /// Raw document-type code.
        type_code: String,
    },
    /// A correspondence with its direction.
    Correspondence {
        /// Incoming or outgoing.
        direction: Direction,
    },
    /// Meeting minutes.
    ProcesVerbal,
}

/// Raw codification fields supplied by an entity-creation or update handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodificationRequest {
    /// Company code, e.g. `TAVTUN`.
    pub company_code: String,
    /// Scope code, e.g. `NBE`.
    pub scope_code: String,
    /// Department code, e.g. `QMS`.
    pub department_code: String,
    /// Optional sub-department code. Blank is treated as absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_department_code: Option<String>,
    /// Entity kind and its type information.
    #[serde(flatten)]
    pub kind: RequestedKind,
    /// Language code, e.g. `FR`.
    pub language_code: String,
}

impl CodificationRequest {
    /// Creates a request without a sub-department.
    pub fn new(
        company_code: impl Into<String>,
        scope_code: impl Into<String>,
        department_code: impl Into<String>,
        kind: RequestedKind,
        language_code: impl Into<String>,
    ) -> Self {
        Self {
            company_code: company_code.into(),
            scope_code: scope_code.into(),
            department_code: department_code.into(),
            sub_department_code: None,
            kind,
            language_code: language_code.into(),
        }
    }

    /// Sets the sub-department code.
    #[must_use]
    pub fn with_sub_department(mut self, code: impl Into<String>) -> Self {
        self.sub_department_code = Some(code.into());
        self
    }
}

/// A codification dimension, used to report which field is at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// The company segment.
    Company,
    /// The scope segment.
    Scope,
    /// The department segment.
    Department,
    /// The sub-department segment.
    SubDepartment,
    /// The type segment (document type, direction or `PV`).
    Type,
    /// The language segment.
    Language,
}

impl Field {
    /// The taxonomy category this field is validated against, if any.
    ///
    /// The company is not part of the taxonomy, and only document types are
    /// looked up for the type segment.
    #[must_use]
    pub const fn category(self, kind: &EntityKind) -> Option<Category> {
        match self {
            Self::Company => None,
            Self::Scope => Some(Category::Scopes),
            Self::Department => Some(Category::Departments),
            Self::SubDepartment => Some(Category::SubDepartments),
            Self::Language => Some(Category::Languages),
            Self::Type => match kind {
                EntityKind::Document { .. } => Some(Category::DocumentTypes),
                EntityKind::Correspondence { .. } | EntityKind::ProcesVerbal => None,
            },
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Company => "company",
            Self::Scope => "scope",
            Self::Department => "department",
            Self::SubDepartment => "sub-department",
            Self::Type => "type",
            Self::Language => "language",
        })
    }
}

/// Reasons a codification request is rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum CodificationError {
    /// A required dimension is empty.
    #[error("missing {0} code")]
    Missing(Field),

    /// A dimension contains characters that cannot appear in a code.
    #[error("invalid {field} code '{value}'")]
    Malformed {
        /// The offending field.
        field: Field,
        /// The value as supplied.
        value: String,
    },

    /// A dimension is not defined in its taxonomy category.
    #[error("{field} code '{code}' is not defined in the taxonomy")]
    Unknown {
        /// The offending field.
        field: Field,
        /// The normalised code.
        code: String,
    },

    /// The sub-department collides with the sequence-key sentinel.
    #[error("sub-department code 'NA' is reserved")]
    ReservedSubDepartment,
}

fn segment(field: Field, value: &str) -> Result<SegmentCode, CodificationError> {
    SegmentCode::new(value).map_err(|e| match e {
        InvalidSegmentError::Empty => CodificationError::Missing(field),
        InvalidSegmentError::Malformed(value) => CodificationError::Malformed { field, value },
    })
}

/// A syntactically valid set of codification dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codification {
    company: SegmentCode,
    scope: SegmentCode,
    department: SegmentCode,
    sub_department: Option<SegmentCode>,
    kind: EntityKind,
    type_code: SegmentCode,
    language: SegmentCode,
}

impl Codification {
    /// Validates the syntax of every dimension of a request.
    ///
    /// # Errors
    ///
    /// Returns [`CodificationError::Missing`] for an empty required field,
    /// [`CodificationError::Malformed`] for a field that cannot be a code
    /// segment, and [`CodificationError::ReservedSubDepartment`] when the
    /// sub-department equals the sequence-key sentinel.
    pub fn from_request(request: &CodificationRequest) -> Result<Self, CodificationError> {
        let company = segment(Field::Company, &request.company_code)?;
        let scope = segment(Field::Scope, &request.scope_code)?;
        let department = segment(Field::Department, &request.department_code)?;

        let sub_department = match request.sub_department_code.as_deref() {
            Some(code) if !code.trim().is_empty() => {
                let code = segment(Field::SubDepartment, code)?;
                if code.as_str() == NO_SUB_DEPARTMENT {
                    return Err(CodificationError::ReservedSubDepartment);
                }
                Some(code)
            }
            _ => None,
        };

        let kind = match &request.kind {
            RequestedKind::Document { type_code } => EntityKind::Document {
                type_code: segment(Field::Type, type_code)?,
            },
            RequestedKind::Correspondence { direction } => EntityKind::Correspondence {
                direction: *direction,
            },
            RequestedKind::ProcesVerbal => EntityKind::ProcesVerbal,
        };
        let type_code = segment(Field::Type, kind.type_code())?;

        let language = segment(Field::Language, &request.language_code)?;

        Ok(Self {
            company,
            scope,
            department,
            sub_department,
            kind,
            type_code,
            language,
        })
    }

    /// The company segment.
    #[must_use]
    pub const fn company(&self) -> &SegmentCode {
        &self.company
    }

    /// The scope segment.
    #[must_use]
    pub const fn scope(&self) -> &SegmentCode {
        &self.scope
    }

    /// The department segment.
    #[must_use]
    pub const fn department(&self) -> &SegmentCode {
        &self.department
    }

    /// The sub-department segment, if any.
    #[must_use]
    pub const fn sub_department(&self) -> Option<&SegmentCode> {
        self.sub_department.as_ref()
    }

    /// The entity kind.
    #[must_use]
    pub const fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// The resolved type segment.
    #[must_use]
    pub const fn type_code(&self) -> &SegmentCode {
        &self.type_code
    }

    /// The language segment.
    #[must_use]
    pub const fn language(&self) -> &SegmentCode {
        &self.language
    }

    /// Every dimension that is subject to taxonomy lookup, with its value.
    pub(crate) fn dimensions(&self) -> impl Iterator<Item = (Field, &str)> {
        [
            Some((Field::Scope, self.scope.as_str())),
            Some((Field::Department, self.department.as_str())),
            self.sub_department
                .as_ref()
                .map(|code| (Field::SubDepartment, code.as_str())),
            Some((Field::Type, self.type_code.as_str())),
            Some((Field::Language, self.language.as_str())),
        ]
        .into_iter()
        .flatten()
    }

    /// The key of the counter this codification draws its sequence from.
    #[must_use]
    pub fn sequence_key(&self) -> SequenceKey {
        let sub_department = self
            .sub_department
            .as_ref()
            .map_or(NO_SUB_DEPARTMENT, SegmentCode::as_str);

        let key = [
            self.company.as_str(),
            self.scope.as_str(),
            self.department.as_str(),
            sub_department,
            self.type_code.as_str(),
            self.language.as_str(),
        ]
        .join(&DELIMITER.to_string());

        SequenceKey(key)
    }
}

/// Identifies one independent sequence counter.
///
/// Built from company, scope, department, sub-department (or `NA`), type and
/// language, in that order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceKey(String);

impl SequenceKey {
    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SequenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn minutes() -> CodificationRequest {
        CodificationRequest::new("TAVTUN", "NBE", "QMS", RequestedKind::ProcesVerbal, "FR")
    }

    #[test]
    fn sequence_key_uses_sentinel_for_missing_sub_department() {
        let codification = Codification::from_request(&minutes()).unwrap();
        assert_eq!(codification.sequence_key().as_str(), "TAVTUN-NBE-QMS-NA-PV-FR");
    }

    #[test]
    fn sequence_key_includes_sub_department() {
        let request = minutes().with_sub_department("AUD");
        let codification = Codification::from_request(&request).unwrap();
        assert_eq!(codification.sequence_key().as_str(), "TAVTUN-NBE-QMS-AUD-PV-FR");
    }

    #[test]
    fn blank_sub_department_is_absent() {
        let request = minutes().with_sub_department("  ");
        let codification = Codification::from_request(&request).unwrap();
        assert!(codification.sub_department().is_none());
    }

    #[test]
    fn sentinel_sub_department_is_reserved() {
        let request = minutes().with_sub_department("na");
        assert_eq!(
            Codification::from_request(&request),
            Err(CodificationError::ReservedSubDepartment)
        );
    }

    #[test]
    fn keys_differ_per_dimension() {
        let base = Codification::from_request(&minutes()).unwrap().sequence_key();

        let variants = [
            CodificationRequest::new("OTHER", "NBE", "QMS", RequestedKind::ProcesVerbal, "FR"),
            CodificationRequest::new("TAVTUN", "MIR", "QMS", RequestedKind::ProcesVerbal, "FR"),
            CodificationRequest::new("TAVTUN", "NBE", "OPS", RequestedKind::ProcesVerbal, "FR"),
            minutes().with_sub_department("AUD"),
            CodificationRequest::new(
                "TAVTUN",
                "NBE",
                "QMS",
                RequestedKind::Correspondence {
                    direction: Direction::In,
                },
                "FR",
            ),
            CodificationRequest::new("TAVTUN", "NBE", "QMS", RequestedKind::ProcesVerbal, "EN"),
        ];

        for request in variants {
            let key = Codification::from_request(&request).unwrap().sequence_key();
            assert_ne!(key, base, "{request:?} should select its own counter");
        }
    }

    #[test_case(RequestedKind::ProcesVerbal, "PV"; "minutes")]
    #[test_case(RequestedKind::Correspondence { direction: Direction::In }, "IN"; "incoming")]
    #[test_case(RequestedKind::Correspondence { direction: Direction::Out }, "OUT"; "outgoing")]
    #[test_case(RequestedKind::Document { type_code: "proc".into() }, "PROC"; "document")]
    fn type_segment_follows_kind(kind: RequestedKind, expected: &str) {
        let request = CodificationRequest::new("TAVTUN", "NBE", "QMS", kind, "FR");
        let codification = Codification::from_request(&request).unwrap();
        assert_eq!(codification.kind().type_code(), expected);
    }

    #[test]
    fn empty_department_is_missing() {
        let request =
            CodificationRequest::new("TAVTUN", "NBE", "", RequestedKind::ProcesVerbal, "FR");
        assert_eq!(
            Codification::from_request(&request),
            Err(CodificationError::Missing(Field::Department))
        );
    }

    #[test]
    fn empty_document_type_is_missing() {
        let request = CodificationRequest::new(
            "TAVTUN",
            "NBE",
            "QMS",
            RequestedKind::Document {
                type_code: String::new(),
            },
            "FR",
        );
        assert_eq!(
            Codification::from_request(&request),
            Err(CodificationError::Missing(Field::Type))
        );
    }

    #[test]
    fn delimiter_in_segment_is_malformed() {
        let request =
            CodificationRequest::new("TAV-TUN", "NBE", "QMS", RequestedKind::ProcesVerbal, "FR");
        assert!(matches!(
            Codification::from_request(&request),
            Err(CodificationError::Malformed {
                field: Field::Company,
                ..
            })
        ));
    }

    #[test]
    fn request_deserialises_from_handler_json() {
        let json = r#"{
            "company_code": "TAVTUN",
            "scope_code": "NBE",
            "department_code": "QMS",
            "entity_kind": "CORRESPONDENCE",
            "direction": "OUT",
            "language_code": "FR"
        }"#;
        let request: CodificationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(
            request.kind,
            RequestedKind::Correspondence {
                direction: Direction::Out
            }
        );
        assert_eq!(request.sub_department_code, None);
    }

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("in".parse::<Direction>(), Ok(Direction::In));
        assert_eq!(" OUT ".parse::<Direction>(), Ok(Direction::Out));
        assert!("sideways".parse::<Direction>().is_err());
    }
}
