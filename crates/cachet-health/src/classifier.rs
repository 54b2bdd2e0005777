//! Threshold classifier. Turns a saturated history window into a verdict.
//!
//! Three legs are evaluated in strict priority order:
//!
//! ```text
//! plain    (configured?) ── yes ─→ triggered | none   (other legs ignored)
//!    │ no
//! critical ── triggered ─→ critical
//!    │ not triggered
//! partial  ── triggered ─→ partial
//! ```
//!
//! Within a leg the count threshold wins over the percent threshold.
//! Percentages are truncated toward zero before comparison.

use cachet_core::{ComponentStatus, MonitorConfig};

use crate::window::HistoryWindow;

/// One threshold leg. A value of 0 disables that half of the leg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Leg {
    /// Trigger when at least this many outcomes are down.
    pub count: usize,
    /// Trigger when the down percentage exceeds this value.
    pub percent: usize,
}

impl Leg {
    pub fn new(count: usize, percent: usize) -> Self {
        Self { count, percent }
    }

    pub fn is_configured(&self) -> bool {
        self.count > 0 || self.percent > 0
    }

    fn evaluate(&self, down_count: usize, down_percent: usize) -> bool {
        if self.count > 0 {
            down_count >= self.count
        } else if self.percent > 0 {
            exceeds(down_percent, self.percent)
        } else {
            false
        }
    }
}

/// A percent threshold is exceeded strictly, except that 100 (the ceiling)
/// is reached by a fully down window.
fn exceeds(down_percent: usize, threshold: usize) -> bool {
    if threshold >= 100 {
        down_percent >= 100
    } else {
        down_percent > threshold
    }
}

/// The three legs of a monitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thresholds {
    pub plain: Leg,
    pub critical: Leg,
    pub partial: Leg,
}

impl Thresholds {
    /// Read the (already validated) thresholds of a monitor.
    pub fn from_config(config: &MonitorConfig) -> Self {
        let leg = |count: i64, percent: i64| Leg::new(count.max(0) as usize, percent.max(0) as usize);
        Self {
            plain: leg(config.threshold_count, config.threshold),
            critical: leg(config.threshold_critical_count, config.threshold_critical),
            partial: leg(config.threshold_partial_count, config.threshold_partial),
        }
    }
}

/// Outcome of evaluating a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verdict {
    #[default]
    None,
    Triggered,
    Critical,
    Partial,
}

impl Verdict {
    pub fn is_triggered(self) -> bool {
        self != Self::None
    }

    /// Component status the status page should show for this verdict.
    pub fn desired_status(self) -> Option<ComponentStatus> {
        match self {
            Self::None => None,
            Self::Triggered | Self::Critical => Some(ComponentStatus::MajorOutage),
            Self::Partial => Some(ComponentStatus::PartialOutage),
        }
    }
}

/// Counts and verdict for one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    pub up_count: usize,
    pub down_count: usize,
    /// `down_count * 100 / len`, truncated.
    pub down_percent: usize,
    pub saturated: bool,
    pub verdict: Verdict,
}

impl Classification {
    /// No down outcome in the window, saturated or not.
    pub fn fully_available(&self) -> bool {
        self.down_count == 0
    }
}

/// Evaluate `window` against `thresholds`.
pub fn classify(window: &HistoryWindow, thresholds: &Thresholds) -> Classification {
    let len = window.len();
    let down_count = window.down_count();
    let down_percent = if len == 0 { 0 } else { down_count * 100 / len };

    let mut classification = Classification {
        up_count: len - down_count,
        down_count,
        down_percent,
        saturated: window.is_saturated(),
        verdict: Verdict::None,
    };

    if !classification.saturated || down_count == 0 {
        return classification;
    }

    classification.verdict = if thresholds.plain.is_configured() {
        if thresholds.plain.evaluate(down_count, down_percent) {
            Verdict::Triggered
        } else {
            Verdict::None
        }
    } else if thresholds.critical.evaluate(down_count, down_percent) {
        Verdict::Critical
    } else if thresholds.partial.evaluate(down_count, down_percent) {
        Verdict::Partial
    } else {
        Verdict::None
    };

    classification
}
