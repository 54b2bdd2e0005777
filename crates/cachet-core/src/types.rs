//! Status-page domain types.
//!
//! Status codes follow the Cachet numbering: components move between
//! operational (1) and major outage (4), incidents between investigating (1)
//! and fixed (4).

use serde::{Deserialize, Serialize};

/// Identifier of a status-page component.
pub type ComponentId = u32;

/// Identifier of a status-page metric.
pub type MetricId = u32;

/// Identifier assigned to an incident by the status page.
pub type IncidentId = u32;

// ── Component ──────────────────────────────────────────────────────

/// Status of a status-page component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ComponentStatus {
    /// Not yet known (never loaded, or the status page reported 0).
    #[default]
    Unknown,
    Operational,
    PerformanceIssues,
    PartialOutage,
    MajorOutage,
}

impl ComponentStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Operational => 1,
            Self::PerformanceIssues => 2,
            Self::PartialOutage => 3,
            Self::MajorOutage => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::Operational),
            2 => Some(Self::PerformanceIssues),
            3 => Some(Self::PartialOutage),
            4 => Some(Self::MajorOutage),
            _ => None,
        }
    }

    pub fn is_up(self) -> bool {
        self == Self::Operational
    }
}

impl TryFrom<u8> for ComponentStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown component status {code}"))
    }
}

impl From<ComponentStatus> for u8 {
    fn from(status: ComponentStatus) -> Self {
        status.code()
    }
}

impl std::fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Unknown => "unknown",
            Self::Operational => "operational",
            Self::PerformanceIssues => "performance issues",
            Self::PartialOutage => "partial outage",
            Self::MajorOutage => "major outage",
        };
        write!(f, "{label} ({})", self.code())
    }
}

/// Snapshot of a component as reported by the status page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentData {
    pub id: ComponentId,
    pub name: String,
    pub enabled: bool,
    pub status: ComponentStatus,
}

// ── Incident ───────────────────────────────────────────────────────

/// Lifecycle state of an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum IncidentStatus {
    Investigating,
    Identified,
    Watching,
    Fixed,
}

impl IncidentStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Investigating => 1,
            Self::Identified => 2,
            Self::Watching => 3,
            Self::Fixed => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Investigating),
            2 => Some(Self::Identified),
            3 => Some(Self::Watching),
            4 => Some(Self::Fixed),
            _ => None,
        }
    }
}

impl TryFrom<u8> for IncidentStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown incident status {code}"))
    }
}

impl From<IncidentStatus> for u8 {
    fn from(status: IncidentStatus) -> Self {
        status.code()
    }
}

/// An incident as exchanged with the status page.
///
/// `id` stays `None` until the status page has accepted the incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub id: Option<IncidentId>,
    pub component_id: ComponentId,
    /// Subject line.
    pub name: String,
    /// Body text.
    pub message: String,
    pub notify: bool,
    pub visible: bool,
    pub status: IncidentStatus,
    /// Status the component is forced to when the incident is sent.
    pub component_status: ComponentStatus,
}

impl Incident {
    /// Build a new, not yet sent, incident for a component.
    pub fn new(
        component_id: ComponentId,
        name: String,
        message: String,
        component_status: ComponentStatus,
    ) -> Self {
        Self {
            id: None,
            component_id,
            name,
            message,
            notify: true,
            visible: true,
            status: IncidentStatus::Investigating,
            component_status,
        }
    }

    pub fn set_investigating(&mut self) {
        self.status = IncidentStatus::Investigating;
    }

    /// Mark the incident resolved; the component goes back to operational.
    pub fn set_fixed(&mut self) {
        self.status = IncidentStatus::Fixed;
        self.component_status = ComponentStatus::Operational;
    }

    pub fn is_fixed(&self) -> bool {
        self.status == IncidentStatus::Fixed
    }
}
