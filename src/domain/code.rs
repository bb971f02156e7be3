use std::{fmt, num::NonZeroU64, str::FromStr};

use serde::Serialize;

use crate::domain::{
    codification::{Codification, DELIMITER},
    segment::{InvalidSegmentError, SegmentCode},
};

/// Default width of the zero-padded sequence segment.
pub const DEFAULT_DIGITS: usize = 3;

/// A structured document code.
///
/// Format:
/// `{COMPANY}-{SCOPE}-{DEPT}[-{SUBDEPT}]-{TYPE}-{SEQ}-{LANG}`, where `SEQ` is a
/// positive integer zero-padded to a configurable width. The sub-department
/// segment is omitted entirely when absent.
///
/// Examples: `TAVTUN-NBE-QMS-PV-001-FR`, `TAVTUN-NBE-QMS-AUD-PROC-012-EN`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DocumentCode {
    company: SegmentCode,
    scope: SegmentCode,
    department: SegmentCode,
    sub_department: Option<SegmentCode>,
    type_code: SegmentCode,
    sequence: NonZeroU64,
    language: SegmentCode,
}

impl DocumentCode {
    /// Assembles the code for a validated codification and an issued
    /// sequence number.
    #[must_use]
    pub fn new(codification: &Codification, sequence: NonZeroU64) -> Self {
        Self {
            company: codification.company().clone(),
            scope: codification.scope().clone(),
            department: codification.department().clone(),
            sub_department: codification.sub_department().cloned(),
            type_code: codification.type_code().clone(),
            sequence,
            language: codification.language().clone(),
        }
    }

    /// The sequence number.
    #[must_use]
    pub const fn sequence(&self) -> NonZeroU64 {
        self.sequence
    }

    /// The type segment.
    #[must_use]
    pub fn type_code(&self) -> &str {
        self.type_code.as_str()
    }

    /// The sub-department segment, if present.
    #[must_use]
    pub fn sub_department(&self) -> Option<&str> {
        self.sub_department.as_ref().map(SegmentCode::as_str)
    }

    /// Whether this code was issued for the given codification.
    ///
    /// The sequence number is ignored; only the six dimensions are compared.
    #[must_use]
    pub fn matches(&self, codification: &Codification) -> bool {
        &self.company == codification.company()
            && &self.scope == codification.scope()
            && &self.department == codification.department()
            && self.sub_department.as_ref() == codification.sub_department()
            && &self.type_code == codification.type_code()
            && &self.language == codification.language()
    }

    /// Returns a displayable representation with the specified digit width.
    ///
    /// Sequence numbers wider than `digits` are printed in full, never
    /// truncated.
    ///
    /// # Examples
    ///
    /// ```
    /// use doccode::DocumentCode;
    ///
    /// let code: DocumentCode = "TAVTUN-NBE-QMS-PV-42-FR".parse().unwrap();
    ///
    /// assert_eq!(code.display(3).to_string(), "TAVTUN-NBE-QMS-PV-042-FR");
    /// assert_eq!(code.display(4).to_string(), "TAVTUN-NBE-QMS-PV-0042-FR");
    /// assert_eq!(code.display(1).to_string(), "TAVTUN-NBE-QMS-PV-42-FR");
    /// ```
    #[must_use]
    pub const fn display(&self, digits: usize) -> FormattedCode<'_> {
        FormattedCode { code: self, digits }
    }
}

impl fmt::Display for DocumentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display(DEFAULT_DIGITS))
    }
}

/// A wrapper type that formats a [`DocumentCode`] with a specified digit
/// width.
///
/// Returned by [`DocumentCode::display`].
#[derive(Debug, Clone, Copy)]
pub struct FormattedCode<'a> {
    code: &'a DocumentCode,
    digits: usize,
}

impl fmt::Display for FormattedCode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.code;
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}",
            code.company, code.scope, code.department
        )?;
        if let Some(sub_department) = &code.sub_department {
            write!(f, "{DELIMITER}{sub_department}")?;
        }
        write!(
            f,
            "{DELIMITER}{}{DELIMITER}{:0width$}{DELIMITER}{}",
            code.type_code,
            code.sequence,
            code.language,
            width = self.digits
        )
    }
}

/// Errors that can occur when parsing a document code.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    /// The code does not have six or seven non-empty segments.
    #[error("invalid document code format: {0}")]
    Syntax(String),

    /// The sequence segment is not a positive integer.
    #[error("invalid sequence in document code '{0}': expected a non-zero integer, got {1}")]
    Sequence(String, String),

    /// A segment contains invalid characters.
    #[error(transparent)]
    Segment(#[from] InvalidSegmentError),
}

impl FromStr for DocumentCode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(DELIMITER).collect();

        if !(6..=7).contains(&parts.len()) || parts.iter().any(|part| part.is_empty()) {
            return Err(ParseError::Syntax(s.to_string()));
        }

        let sequence_str = parts[parts.len() - 2];
        let sequence = Some(sequence_str)
            .filter(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<u64>().ok())
            .and_then(NonZeroU64::new)
            .ok_or_else(|| ParseError::Sequence(s.to_string(), sequence_str.to_string()))?;

        let sub_department = if parts.len() == 7 {
            Some(SegmentCode::new(parts[3])?)
        } else {
            None
        };

        Ok(Self {
            company: SegmentCode::new(parts[0])?,
            scope: SegmentCode::new(parts[1])?,
            department: SegmentCode::new(parts[2])?,
            sub_department,
            type_code: SegmentCode::new(parts[parts.len() - 3])?,
            sequence,
            language: SegmentCode::new(parts[parts.len() - 1])?,
        })
    }
}

impl TryFrom<&str> for DocumentCode {
    type Error = ParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}

/// The result of issuing a code: the rendered code and the sequence number
/// consumed for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedCode {
    /// The formatted code to store on the entity.
    pub code: String,
    /// The sequence number drawn from the counter.
    pub sequence_number: NonZeroU64,
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::codification::{CodificationRequest, Direction, RequestedKind};

    fn codification(sub_department: Option<&str>) -> Codification {
        let mut request = CodificationRequest::new(
            "TAVTUN",
            "NBE",
            "QMS",
            RequestedKind::Document {
                type_code: "PROC".to_string(),
            },
            "FR",
        );
        request.sub_department_code = sub_department.map(str::to_string);
        Codification::from_request(&request).unwrap()
    }

    fn seq(n: u64) -> NonZeroU64 {
        NonZeroU64::new(n).unwrap()
    }

    #[test_case(3, 1, "TAVTUN-NBE-QMS-PROC-001-FR"; "3 digits id 1")]
    #[test_case(3, 42, "TAVTUN-NBE-QMS-PROC-042-FR"; "3 digits id 42")]
    #[test_case(3, 999, "TAVTUN-NBE-QMS-PROC-999-FR"; "3 digits at boundary")]
    #[test_case(3, 1000, "TAVTUN-NBE-QMS-PROC-1000-FR"; "3 digits widens")]
    #[test_case(4, 7, "TAVTUN-NBE-QMS-PROC-0007-FR"; "4 digits")]
    fn display_pads_sequence(digits: usize, sequence: u64, expected: &str) {
        let code = DocumentCode::new(&codification(None), seq(sequence));
        assert_eq!(code.display(digits).to_string(), expected);
    }

    #[test]
    fn absent_sub_department_leaves_no_empty_segment() {
        let code = DocumentCode::new(&codification(None), seq(1)).to_string();
        assert!(!code.contains("--"));
        assert_eq!(code.split(DELIMITER).count(), 6);
    }

    #[test]
    fn sub_department_sits_after_department() {
        let code = DocumentCode::new(&codification(Some("aud")), seq(12));
        assert_eq!(code.to_string(), "TAVTUN-NBE-QMS-AUD-PROC-012-FR");
    }

    #[test]
    fn correspondence_uses_direction_as_type() {
        let request = CodificationRequest::new(
            "TAVTUN",
            "NBE",
            "QMS",
            RequestedKind::Correspondence {
                direction: Direction::Out,
            },
            "EN",
        );
        let codification = Codification::from_request(&request).unwrap();
        let code = DocumentCode::new(&codification, seq(5));
        assert_eq!(code.to_string(), "TAVTUN-NBE-QMS-OUT-005-EN");
    }

    #[test]
    fn parse_without_sub_department() {
        let code = DocumentCode::try_from("TAVTUN-NBE-QMS-PV-001-FR").unwrap();
        assert_eq!(code.sub_department(), None);
        assert_eq!(code.type_code(), "PV");
        assert_eq!(code.sequence().get(), 1);
    }

    #[test]
    fn parse_with_sub_department() {
        let code = DocumentCode::try_from("TAVTUN-NBE-QMS-AUD-PROC-1200-FR").unwrap();
        assert_eq!(code.sub_department(), Some("AUD"));
        assert_eq!(code.type_code(), "PROC");
        assert_eq!(code.sequence().get(), 1200);
    }

    #[test_case("TAVTUN-NBE-PV-001-FR"; "too few segments")]
    #[test_case("A-B-C-D-E-F-001-FR"; "too many segments")]
    #[test_case("TAVTUN-NBE--PV-001-FR"; "empty segment")]
    #[test_case(""; "empty")]
    fn parse_rejects_bad_shape(input: &str) {
        assert!(matches!(
            DocumentCode::try_from(input),
            Err(ParseError::Syntax(_))
        ));
    }

    #[test_case("TAVTUN-NBE-QMS-PV-000-FR"; "zero")]
    #[test_case("TAVTUN-NBE-QMS-PV-ABC-FR"; "letters")]
    #[test_case("TAVTUN-NBE-QMS-PV-+5-FR"; "leading plus sign")]
    #[test_case("TAVTUN-NBE-QMS-PV- 5-FR"; "leading whitespace")]
    fn parse_rejects_bad_sequence(input: &str) {
        assert!(matches!(
            DocumentCode::try_from(input),
            Err(ParseError::Sequence(_, _))
        ));
    }

    #[test]
    fn matches_ignores_sequence() {
        let code = DocumentCode::new(&codification(Some("AUD")), seq(9));
        assert!(code.matches(&codification(Some("AUD"))));
        assert!(!code.matches(&codification(None)));
    }

    #[test]
    fn parsed_code_matches_its_codification() {
        let code: DocumentCode = "TAVTUN-NBE-QMS-PROC-003-FR".parse().unwrap();
        assert!(code.matches(&codification(None)));
    }
}
