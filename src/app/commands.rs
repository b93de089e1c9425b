//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (HTTP gateway,
//! serial console) that the [`LoggerService`](super::service::LoggerService)
//! interprets and acts upon.

use crate::config::LoggerConfig;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Wipe every record and restart the sequence at 1.
    ClearStore,

    /// Hot-reload configuration.  Only the logging interval takes
    /// effect without a reboot.
    UpdateConfig(LoggerConfig),
}
