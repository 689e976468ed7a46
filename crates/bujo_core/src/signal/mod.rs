//! Change signals for polling clients.
//!
//! # Responsibility
//! - Fingerprint presentation-level collections deterministically.
//! - Compute only the collections a client asks for.
//!
//! # Invariants
//! - Identical canonical content yields identical signals across processes.
//! - Any observable field change (or order change, where order is
//!   significant) changes the signal.
//! - Unknown target names are rejected, never skipped.

use crate::source::SourceError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod computer;
mod coordinator;
mod target;

pub use computer::{ChangeSignal, NamedCollection, OrderRule, SignalComputer};
pub use coordinator::{UpdateSignalCoordinator, UpdateSignals};
pub use target::UpdateTarget;

pub type SignalResult<T> = Result<T, SignalError>;

#[derive(Debug)]
pub enum SignalError {
    /// Target name outside the tracked set.
    UnsupportedTarget(String),
    /// Records could not be rendered to canonical JSON.
    Serialization(String),
    /// One or more collection fetches failed; causes are in target order.
    SourceUnavailable(Vec<(UpdateTarget, SourceError)>),
}

impl SignalError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedTarget(_) => "unsupported_target",
            Self::Serialization(_) => "serialization_failed",
            Self::SourceUnavailable(_) => "source_unavailable",
        }
    }

    /// Targets whose fetch failed; empty for other variants.
    pub fn failed_targets(&self) -> Vec<UpdateTarget> {
        match self {
            Self::SourceUnavailable(failures) => failures.iter().map(|(target, _)| *target).collect(),
            _ => Vec::new(),
        }
    }
}

impl Display for SignalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedTarget(value) => write!(
                f,
                "unsupported update target `{value}`; expected one of {}",
                UpdateTarget::wire_names().join("|")
            ),
            Self::Serialization(message) => write!(f, "cannot canonicalize collection: {message}"),
            Self::SourceUnavailable(failures) => {
                write!(f, "collection fetch failed for ")?;
                for (index, (target, cause)) in failures.iter().enumerate() {
                    if index > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{target}: {cause}")?;
                }
                Ok(())
            }
        }
    }
}

impl Error for SignalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SourceUnavailable(failures) => failures
                .first()
                .map(|(_, cause)| cause as &(dyn Error + 'static)),
            _ => None,
        }
    }
}
