//! Diagnostic types for convention violations

use serde::{Deserialize, Serialize};

/// Severity level for diagnostics
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,
    /// Warning - convention drift that should be fixed
    Warning,
    /// Error - convention violation that gates the build
    #[default]
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" | "hint" | "note" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" | "err" => Ok(Severity::Error),
            _ => Err(()),
        }
    }
}

/// Source location inside the analyzed file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Location {
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based), when the host reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl Location {
    pub fn line(line: usize) -> Self {
        Self { line, column: None }
    }

    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }
}

/// A reported convention violation
///
/// `identifier` names the violation kind, not the occurrence: every
/// occurrence of the same kind carries the same identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable, dotted identifier (e.g. "symfonyWebTest.controllerTestBase")
    pub identifier: String,
    /// Severity level
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Source location
    pub location: Location,
    /// Remediation text, may span several lines and contain code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with the default severity
    pub fn new(identifier: &str, message: impl Into<String>, line: usize) -> Self {
        Self {
            identifier: identifier.to_string(),
            severity: Severity::default(),
            message: message.into(),
            location: Location::line(line),
            tip: None,
        }
    }

    /// Attach remediation text
    pub fn with_tip(mut self, tip: impl Into<String>) -> Self {
        self.tip = Some(tip.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Check if this is a warning
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("error".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("warn".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("hint".parse::<Severity>(), Ok(Severity::Info));
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn test_diagnostic_creation() {
        let diag = Diagnostic::new("controller.invokeResponse", "Missing response", 12)
            .with_tip("Declare `: Response`");

        assert_eq!(diag.identifier, "controller.invokeResponse");
        assert_eq!(diag.location.line, 12);
        assert_eq!(diag.location.column, None);
        assert_eq!(diag.tip.as_deref(), Some("Declare `: Response`"));
        assert!(diag.is_error());
    }

    #[test]
    fn test_json_omits_empty_tip_and_column() {
        let diag = Diagnostic::new("a.b", "msg", 3).with_severity(Severity::Warning);
        let json = serde_json::to_string(&diag).unwrap();

        assert!(!json.contains("tip"));
        assert!(!json.contains("column"));
        assert!(json.contains("\"severity\":\"warning\""));
    }

    #[test]
    fn test_location_with_column() {
        let loc = Location::line(4).with_column(9);
        assert_eq!(loc.column, Some(9));
    }
}
