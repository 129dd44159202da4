pub mod config;
pub mod duration;
pub mod types;

pub use config::{CheckSettings, ConfigError, EmailConfig, MonitorConfig, ServiceConfig};
pub use duration::parse_duration;
pub use types::*;
