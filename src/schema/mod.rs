//! Schema module - Configuration and report types for the optimizer.

mod config;
mod dispatch;
mod report;
mod run;

pub use config::*;
pub use dispatch::*;
pub use report::*;
pub use run::*;
