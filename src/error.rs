//! Non-fatal generation diagnostics.
//!
//! Fatal failures (directory setup, model load, writes) travel as
//! `anyhow::Error`. Everything here is collected during a run and reported
//! once it completes.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A parsed type could not be resolved and the overlay forbids the wildcard.
    #[error("unresolved type for {member}: {detail} (applyUnknownType is false, member skipped)")]
    UnresolvedType { member: String, detail: String },

    /// A persisted overlay record failed to decode and was treated as absent.
    #[error("corrupt overlay record {member}: {reason}")]
    OverlayCorrupt { member: String, reason: String },

    /// A template still referenced a placeholder nobody resolves.
    #[error("unknown placeholder ${{{placeholder}}} in {kind} template (rendering {member})")]
    TemplateResolution {
        member: String,
        kind: &'static str,
        placeholder: String,
    },
}

/// Ordered, de-duplicated list of diagnostics for one run.
///
/// Several passes merge the same member, so the same problem can be seen
/// more than once; only the first sighting is kept.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if !self.entries.contains(&diagnostic) {
            tracing::debug!(%diagnostic, "recorded diagnostic");
            self.entries.push(diagnostic);
        }
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for d in diagnostics {
            self.push(d);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }
}
