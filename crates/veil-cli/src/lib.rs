//! Veil CLI - private messages over untrusted relays
//!
//! This crate provides a command-line interface for:
//! - Managing the local identity
//! - Producing Wrapped envelopes for a recipient
//! - Opening Wrapped envelopes addressed to the local identity
//! - Inspecting what a relay can see
//! - Running an in-process relay round trip

pub mod cli;
pub mod config;
pub mod identity;
pub mod output;

#[cfg(test)]
mod proptests;

pub use cli::Cli;
pub use config::{CliOverrides, Config};
pub use output::{JsonResponse, OutputFormat, OutputFormatter};

/// Exit codes for CLI operations
///
/// - 0: Success
/// - 1: General error
/// - 5: Invalid input (bad key, bad envelope JSON)
/// - 8: Not recoverable (envelope could not be opened with this identity)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidInput = 5,
    NotRecoverable = 8,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Convert to process exit code
    pub fn to_exit_code(self) -> std::process::ExitCode {
        std::process::ExitCode::from(self as u8)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExitCode::Success => "SUCCESS",
            ExitCode::GeneralError => "GENERAL_ERROR",
            ExitCode::InvalidInput => "INVALID_INPUT",
            ExitCode::NotRecoverable => "NOT_RECOVERABLE",
        }
    }
}

#[cfg(test)]
mod exit_code_tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::GeneralError), 1);
        assert_eq!(i32::from(ExitCode::InvalidInput), 5);
        assert_eq!(i32::from(ExitCode::NotRecoverable), 8);
    }

    #[test]
    fn test_exit_code_names() {
        assert_eq!(ExitCode::NotRecoverable.name(), "NOT_RECOVERABLE");
        assert_eq!(ExitCode::InvalidInput.name(), "INVALID_INPUT");
    }
}
