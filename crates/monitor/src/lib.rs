//! Process wiring for the `pairwatch` binary: configuration loading and
//! summary reporting.

pub mod report;
pub mod settings;

pub use report::summary_line;
pub use settings::load_config;
