//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain     | Description                              |
//! |---------|------------|------------------------------------------|
//! | 0       | Universal  | Success                                  |
//! | 1       | Universal  | General error (unspecified)              |
//! | 2       | Universal  | CLI usage error (bad args, set by clap)  |
//! | 10-19   | config     | Settings file codes                      |
//! | 20-29   | io         | Collection load / write codes            |
//! | 30-39   | records    | Malformed input records                  |

use yearlink_config::ConfigError;
use yearlink_io::IoError;

// =============================================================================
// Universal (0-1). Clap exits with 2 on bad arguments.
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

// =============================================================================
// Config (10-19)
// =============================================================================

/// Config parsed but is invalid (bad TOML, unknown key, failed validation).
pub const EXIT_CONFIG_INVALID: u8 = 10;

/// Config file could not be read.
pub const EXIT_CONFIG_READ: u8 = 11;

// =============================================================================
// IO (20-29)
// =============================================================================

/// Collection file missing, unreadable, not JSON or not an array.
pub const EXIT_INPUT: u8 = 20;

/// Collection could not be written back.
pub const EXIT_OUTPUT: u8 = 21;

// =============================================================================
// Records (30-39)
// =============================================================================

/// A record could not be classified or linked; nothing was written.
pub const EXIT_RECORD: u8 = 30;

pub fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::Read { .. } => EXIT_CONFIG_READ,
        ConfigError::Parse(_) | ConfigError::Validation(_) => EXIT_CONFIG_INVALID,
    }
}

pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Read { .. } | IoError::Parse { .. } | IoError::NotAnArray { .. } => EXIT_INPUT,
        IoError::Write { .. } | IoError::Serialize { .. } => EXIT_OUTPUT,
    }
}
