//! Build phase state machine.
//!
//! The host pipeline drives every transition; the core only validates them.
//!
//! ```text
//! Setup → LocalParse → Resolution
//!              ↑            │
//!              └────────────┘  (invalidation for an incremental rebuild)
//! ```
//!
//! Registries accept writes during `Setup` and `LocalParse` and are frozen
//! during `Resolution`, which is what lets resolution run read-only against
//! a stable environment.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BuildPhase
// ---------------------------------------------------------------------------

/// The current phase of a build environment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildPhase {
    /// Environment created; resolvers registered; no document parsed yet.
    #[default]
    Setup,
    /// Documents are being locally parsed; registries accept writes.
    LocalParse,
    /// All local parses complete; registries are frozen; deferred nodes
    /// are being replaced.
    Resolution,
}

impl BuildPhase {
    /// Valid next phases from this phase.
    ///
    /// `Setup → Resolution` covers the degenerate build with zero
    /// documents. `Resolution → LocalParse` is the invalidation path of an
    /// incremental rebuild.
    #[must_use]
    pub const fn valid_transitions(&self) -> &'static [Self] {
        match self {
            Self::Setup => &[Self::LocalParse, Self::Resolution],
            Self::LocalParse => &[Self::Resolution],
            Self::Resolution => &[Self::LocalParse],
        }
    }

    /// Check whether transitioning to `next` is valid.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        self.valid_transitions().contains(&next)
    }

    /// Returns `true` if registries accept writes in this phase.
    #[must_use]
    pub const fn allows_writes(&self) -> bool {
        matches!(self, Self::Setup | Self::LocalParse)
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup => write!(f, "setup"),
            Self::LocalParse => write!(f, "local_parse"),
            Self::Resolution => write!(f, "resolution"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
