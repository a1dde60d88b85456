//! Serializable value types shared across the activity manager.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an activity tracked by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub u64);

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operating system process identifier mapped into a container.
pub type ProcessId = u32;

/// Kind of bus peer behind a [`BusId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusIdKind {
    /// A registered service name.
    Service,
    /// An application id.
    App,
    /// An anonymous bus connection.
    Anonymous,
}

/// Bus address of an entity that can own activities.
///
/// Two ids are the same entity when both kind and name match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BusId {
    /// Peer kind.
    pub kind: BusIdKind,
    /// Bus name.
    pub name: String,
}

impl BusId {
    /// Id for a named service.
    pub fn service(name: impl Into<String>) -> Self {
        Self {
            kind: BusIdKind::Service,
            name: name.into(),
        }
    }

    /// Id for an application.
    pub fn app(name: impl Into<String>) -> Self {
        Self {
            kind: BusIdKind::App,
            name: name.into(),
        }
    }

    /// Id for an anonymous connection.
    pub fn anonymous(name: impl Into<String>) -> Self {
        Self {
            kind: BusIdKind::Anonymous,
            name: name.into(),
        }
    }
}

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            BusIdKind::Service => write!(f, "{}", self.name),
            BusIdKind::App => write!(f, "app:{}", self.name),
            BusIdKind::Anonymous => write!(f, "anon:{}", self.name),
        }
    }
}

/// Scheduling priority of an activity, entity or container.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ActivityPriority {
    /// No priority contribution.
    #[default]
    None,
    /// Lowest priority.
    Lowest,
    /// Low priority.
    Low,
    /// Normal priority.
    Normal,
    /// High priority.
    High,
    /// Highest priority.
    Highest,
}

impl ActivityPriority {
    /// Stable lowercase name used in reports and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Lowest => "lowest",
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Highest => "highest",
        }
    }
}

/// Scheduler enable flags. Activities only run while every flag is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsystemTag {
    /// UI-dependent activities, gated on boot completion.
    Ui,
    /// Externally controlled enable (e.g. by an admin call).
    External,
}

impl SubsystemTag {
    /// Every known flag.
    pub const ALL: [Self; 2] = [Self::Ui, Self::External];
}
