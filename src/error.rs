//! Build protocol error types for weft.
//!
//! Defines [`BuildError`], the unified error type for host-facing build
//! environment operations. Error messages are designed to be actionable:
//! each variant includes a clear description of what went wrong and how the
//! host should fix its call sequence.
//!
//! Nothing in this module describes a data-level failure: dangling
//! references and resolver failures degrade to stubs (see the resolve
//! module), merge snapshot artifacts are silently discarded, and
//! consistency mismatches surface as validation issues. `BuildError` only
//! reports misuse of the phase protocol itself.

use std::fmt;
use std::path::PathBuf;

use crate::model::types::{DocumentId, ValidationError};
use crate::phase::BuildPhase;

// ---------------------------------------------------------------------------
// BuildError
// ---------------------------------------------------------------------------

/// Unified error type for build environment operations.
#[derive(Debug)]
pub enum BuildError {
    /// The requested phase transition is not allowed.
    PhaseViolation {
        /// The environment's current phase.
        from: BuildPhase,
        /// The phase the host tried to enter.
        to: BuildPhase,
    },

    /// A per-document operation was called while another document's local
    /// parse is still open.
    DocumentStillOpen {
        /// The document currently being parsed.
        document: DocumentId,
    },

    /// A per-document operation needs an open document, but none is open.
    NoCurrentDocument,

    /// `end_local_parse` was called for a document that is not the one
    /// currently open.
    DocumentNotOpen {
        /// The document named in the call.
        document: DocumentId,
    },

    /// A registry write was attempted during global resolution.
    WriteDuringResolution,

    /// Resolution was requested for a document the environment has never
    /// parsed.
    UnknownDocument {
        /// The document named in the call.
        document: DocumentId,
    },

    /// An identifier failed validation.
    Validation(ValidationError),

    /// A configuration file could not be loaded or parsed.
    Config {
        /// Path to the configuration file.
        path: PathBuf,
        /// Human-readable description of the problem.
        detail: String,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PhaseViolation { from, to } => {
                write!(
                    f,
                    "invalid phase transition: {from} -> {to}.\n  To fix: drive phases in order (local parse, then global resolution); invalidation is the only way back to parsing."
                )
            }
            Self::DocumentStillOpen { document } => {
                write!(
                    f,
                    "document '{document}' is still open for local parse.\n  To fix: call end_local_parse before opening another document or changing phase."
                )
            }
            Self::NoCurrentDocument => {
                write!(
                    f,
                    "no document is open for local parse.\n  To fix: call begin_document before inserting nodes or scratch state."
                )
            }
            Self::DocumentNotOpen { document } => {
                write!(
                    f,
                    "document '{document}' is not the currently open document.\n  To fix: end_local_parse must name the document passed to begin_document."
                )
            }
            Self::WriteDuringResolution => {
                write!(
                    f,
                    "registries are frozen during global resolution.\n  To fix: complete resolution first, or invalidate the document to return to the parse phase."
                )
            }
            Self::UnknownDocument { document } => {
                write!(
                    f,
                    "document '{document}' has no output tree in this environment.\n  To fix: parse the document (begin_document/end_local_parse) before resolving it."
                )
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::Config { path, detail } => {
                write!(
                    f,
                    "configuration error in '{}': {}\n  To fix: edit the config file and correct the issue.",
                    path.display(),
                    detail
                )
            }
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for BuildError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<crate::config::ConfigError> for BuildError {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config {
            path: err.path.unwrap_or_default(),
            detail: err.message,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::ErrorKind;

    fn doc(s: &str) -> DocumentId {
        DocumentId::new(s).unwrap()
    }

    #[test]
    fn display_phase_violation() {
        let err = BuildError::PhaseViolation {
            from: BuildPhase::Resolution,
            to: BuildPhase::Resolution,
        };
        let msg = format!("{err}");
        assert!(msg.contains("resolution -> resolution"));
        assert!(msg.contains("invalidation"));
    }

    #[test]
    fn display_document_still_open() {
        let err = BuildError::DocumentStillOpen {
            document: doc("apps/crm.md"),
        };
        let msg = format!("{err}");
        assert!(msg.contains("apps/crm.md"));
        assert!(msg.contains("end_local_parse"));
    }

    #[test]
    fn display_no_current_document() {
        let msg = format!("{}", BuildError::NoCurrentDocument);
        assert!(msg.contains("begin_document"));
    }

    #[test]
    fn display_document_not_open() {
        let err = BuildError::DocumentNotOpen {
            document: doc("other.md"),
        };
        let msg = format!("{err}");
        assert!(msg.contains("other.md"));
        assert!(msg.contains("begin_document"));
    }

    #[test]
    fn display_write_during_resolution() {
        let msg = format!("{}", BuildError::WriteDuringResolution);
        assert!(msg.contains("frozen"));
        assert!(msg.contains("invalidate"));
    }

    #[test]
    fn display_unknown_document() {
        let err = BuildError::UnknownDocument {
            document: doc("ghost.md"),
        };
        let msg = format!("{err}");
        assert!(msg.contains("ghost.md"));
        assert!(msg.contains("parse the document"));
    }

    #[test]
    fn display_config_error() {
        let err = BuildError::Config {
            path: PathBuf::from("weft.toml"),
            detail: "unknown field 'foo'".to_owned(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("weft.toml"));
        assert!(msg.contains("unknown field 'foo'"));
    }

    #[test]
    fn from_validation_error() {
        let val_err = ValidationError {
            kind: ErrorKind::Slug,
            value: "BAD".to_owned(),
            reason: "uppercase".to_owned(),
        };
        let err: BuildError = val_err.into();
        assert!(matches!(err, BuildError::Validation(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn source_is_none_for_protocol_errors() {
        let err = BuildError::NoCurrentDocument;
        assert!(std::error::Error::source(&err).is_none());
    }
}
