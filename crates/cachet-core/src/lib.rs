//! cachet-core: configuration and domain model for the status-page monitor.
//!
//! Holds everything the engine consumes but does not compute: the TOML
//! configuration surface and its validation, incident message templates,
//! and the component/incident types exchanged with the status page.

pub mod config;
pub mod error;
pub mod template;
pub mod types;

pub use config::{ApiConfig, CachetConfig, CheckKind, MetricIds, MonitorConfig};
pub use error::{ConfigError, ConfigResult, TemplateError};
pub use template::{MessageTemplate, MonitorTemplates, TemplateContext};
pub use types::*;
