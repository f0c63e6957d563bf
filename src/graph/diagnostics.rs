//! Diagnostics
//!
//! Collects non-fatal findings while the graph is built: unrecognized
//! keywords, unknown type names, unresolved references and the constructs
//! whose checking is not implemented. Validation never writes here.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::NodeId;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Keyword consumed by no applicable validator
    UnrecognizedKeyword,
    /// `type` names something other than a JSON type
    UnknownType,
    /// `format` names something outside the draft-04 set
    UnknownFormat,
    /// Construct is accepted but raises when exercised
    NotImplemented,
    /// `$ref` could not be followed
    UnresolvedRef,
    /// Known `format` that is accepted without checking
    FormatNotEnforced,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnrecognizedKeyword => "W001",
            Self::UnknownType => "W002",
            Self::UnknownFormat => "W003",
            Self::NotImplemented => "W004",
            Self::UnresolvedRef => "E001",
            Self::FormatNotEnforced => "I001",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::UnresolvedRef => Severity::Error,

            Self::UnrecognizedKeyword
            | Self::UnknownType
            | Self::UnknownFormat
            | Self::NotImplemented => Severity::Warning,

            Self::FormatNotEnforced => Severity::Info,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// Node the finding belongs to
    pub node: NodeId,
    /// Where the node was first discovered (`#/definitions/Foo`)
    pub location: String,
    /// Diagnostic code
    pub code: DiagnosticCode,
    /// Human-readable message
    pub message: String,
    /// Offending keywords, pointers or names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(
        node: NodeId,
        location: impl Into<String>,
        code: DiagnosticCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            node,
            location: location.into(),
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({} at {})",
            self.code,
            self.code.severity(),
            self.message,
            self.node,
            self.location
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Collection of diagnostics from the build phase
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic item
    pub fn push(&mut self, item: DiagnosticItem) {
        self.items.push(item);
    }

    /// Keywords that no applicable validator consumed
    pub fn unrecognized_keywords(&mut self, node: NodeId, location: &str, keys: &[String]) {
        let mut item = DiagnosticItem::new(
            node,
            location,
            DiagnosticCode::UnrecognizedKeyword,
            format!("Unused keys {:?} in schema node {}", keys, node),
        );
        for key in keys {
            item = item.with_context(key.clone());
        }
        self.push(item);
    }

    /// `type` value that is not a JSON type name
    pub fn unknown_type(&mut self, node: NodeId, location: &str, type_name: &str) {
        self.push(
            DiagnosticItem::new(
                node,
                location,
                DiagnosticCode::UnknownType,
                format!("Unknown type '{}' constrains nothing", type_name),
            )
            .with_context(type_name.to_string()),
        );
    }

    /// `$ref` that could not be followed
    pub fn unresolved_ref(&mut self, node: NodeId, location: &str, pointer: &str, reason: &str) {
        self.push(
            DiagnosticItem::new(
                node,
                location,
                DiagnosticCode::UnresolvedRef,
                format!("$ref target '{}' could not be resolved: {}", pointer, reason),
            )
            .with_context(pointer.to_string()),
        );
    }

    /// Known format accepted without checking
    pub fn format_not_enforced(&mut self, node: NodeId, location: &str, format: &str) {
        self.push(
            DiagnosticItem::new(
                node,
                location,
                DiagnosticCode::FormatNotEnforced,
                format!("format '{}' is recognized but not checked", format),
            )
            .with_context(format.to_string()),
        );
    }

    /// Format outside the draft-04 set; every string will be rejected
    pub fn unknown_format(&mut self, node: NodeId, location: &str, format: &str) {
        self.push(
            DiagnosticItem::new(
                node,
                location,
                DiagnosticCode::UnknownFormat,
                format!("format '{}' is not recognized", format),
            )
            .with_context(format.to_string()),
        );
    }

    /// Construct that raises `NotImplemented` when exercised
    pub fn not_implemented(&mut self, node: NodeId, location: &str, construct: &str) {
        self.push(
            DiagnosticItem::new(
                node,
                location,
                DiagnosticCode::NotImplemented,
                format!("{} is not implemented and fails validation when reached", construct),
            )
            .with_context(construct.to_string()),
        );
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|i| i.severity() == Severity::Error)
    }

    /// Get all errors
    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Error)
    }

    /// Get all warnings
    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    /// Get all items with a given code
    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(move |i| i.code == code)
    }

    /// Get all items
    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    /// Get total count
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Count errors
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Count warnings
    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Format all diagnostics for display
    pub fn format_all(&self) -> String {
        let mut output = String::new();

        for item in &self.items {
            output.push_str(&format!("{}\n", item));
        }

        if self.has_errors() {
            output.push_str(&format!(
                "\n{} error(s), {} warning(s)\n",
                self.error_count(),
                self.warning_count()
            ));
        } else if !self.is_empty() {
            output.push_str(&format!("\n{} warning(s)\n", self.warning_count()));
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}

impl IntoIterator for Diagnostics {
    type Item = DiagnosticItem;
    type IntoIter = std::vec::IntoIter<DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticItem;
    type IntoIter = std::slice::Iter<'a, DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_severity() {
        assert_eq!(DiagnosticCode::UnresolvedRef.severity(), Severity::Error);
        assert_eq!(DiagnosticCode::UnrecognizedKeyword.severity(), Severity::Warning);
        assert_eq!(DiagnosticCode::FormatNotEnforced.severity(), Severity::Info);
    }

    #[test]
    fn test_diagnostics_collection() {
        let mut diags = Diagnostics::new();
        diags.unresolved_ref(NodeId::new(0), "#", "#/nope", "missing segment 'nope'");
        diags.unrecognized_keywords(NodeId::new(1), "#/properties/a", &["foo".to_string()]);
        diags.format_not_enforced(NodeId::new(2), "#/properties/b", "email");

        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.warning_count(), 1);
        assert_eq!(diags.len(), 3);
        assert!(diags.has_errors());
        assert_eq!(diags.with_code(DiagnosticCode::FormatNotEnforced).count(), 1);
    }

    #[test]
    fn test_unrecognized_keywords_name_keys_and_node() {
        let mut diags = Diagnostics::new();
        diags.unrecognized_keywords(NodeId::new(4), "#", &["bogus".to_string()]);
        let item = &diags.all()[0];
        assert_eq!(item.context, vec!["bogus"]);
        let text = item.to_string();
        assert!(text.contains("bogus"));
        assert!(text.contains("#4"));
    }
}
