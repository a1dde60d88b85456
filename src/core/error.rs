//! Error types for container assignment and requirement handling.

use serde_json::Value;
use thiserror::Error;

use crate::util::serde::{ActivityId, BusId};

/// Errors produced by the container manager.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The entity registry does not know this bus id.
    #[error("unknown bus entity: {0}")]
    UnknownEntity(BusId),
    /// Building the diagnostic report failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors produced when instantiating requirements.
#[derive(Debug, Error)]
pub enum RequirementError {
    /// No provider knows how to instantiate this requirement.
    #[error("{manager} does not know how to instantiate requirement `{requirement}` for activity {activity}")]
    UnknownRequirement {
        /// Name of the manager that rejected the request.
        manager: String,
        /// Requested requirement name.
        requirement: String,
        /// Activity that asked for it.
        activity: ActivityId,
    },
    /// The requirement exists but the supplied value is not legal.
    #[error("invalid value for requirement `{requirement}`: {value}")]
    InvalidValue {
        /// Requirement name.
        requirement: String,
        /// The rejected value.
        value: Value,
    },
}

/// Whether a failed delivery may succeed if the call is reissued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Retrying can plausibly succeed.
    Transient,
    /// Retrying is pointless; the subscription must be abandoned.
    Permanent,
}

impl FailureKind {
    /// Short stable label for logs.
    pub const fn as_label(self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Permanent => "permanent",
        }
    }
}

/// Failure reported by the transport on a standing call.
#[derive(Debug, Clone, Error)]
#[error("{} delivery failure: {}", .kind.as_label(), .response)]
pub struct CallFailure {
    /// Transport's classification of the failure.
    pub kind: FailureKind,
    /// Error payload returned with the failure.
    pub response: Value,
}

impl CallFailure {
    /// A failure worth retrying.
    pub fn transient(response: Value) -> Self {
        Self {
            kind: FailureKind::Transient,
            response,
        }
    }

    /// A failure that ends the subscription.
    pub fn permanent(response: Value) -> Self {
        Self {
            kind: FailureKind::Permanent,
            response,
        }
    }

    /// True when the transport classified this failure as permanent.
    pub fn is_permanent(&self) -> bool {
        self.kind == FailureKind::Permanent
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
