//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                           |
//! |------|---------------------------------------------------|
//! | 0    | Success                                           |
//! | 1    | General error (unspecified)                       |
//! | 2    | CLI usage error (bad args, unsupported format)    |
//! | 3    | Input sheet lacks a required column               |
//! | 4    | Invalid reconciliation profile                    |
//! | 5    | Cannot read or parse an input file                |
//! | 6    | Cannot write the result file                      |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant error mapping below

use regrade_io::IoError;
use regrade_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// A required input column is missing from the header row.
/// The batch is rejected before any row is processed.
pub const EXIT_MISSING_COLUMN: u8 = 3;

/// Profile TOML failed to parse or validate.
pub const EXIT_INVALID_PROFILE: u8 = 4;

/// Input file could not be read, decoded or parsed.
pub const EXIT_READ: u8 = 5;

/// Result file could not be written.
pub const EXIT_WRITE: u8 = 6;

/// Map a ReconError to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::MissingColumn { .. } => EXIT_MISSING_COLUMN,
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_PROFILE,
    }
}

/// Map an IoError to its exit code.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Read { .. }
        | IoError::Csv(_)
        | IoError::Workbook(_)
        | IoError::NoSheets
        | IoError::NoHeader => EXIT_READ,
        IoError::Write { .. } | IoError::Xlsx(_) | IoError::TooManyRows { .. } => EXIT_WRITE,
        IoError::UnsupportedFormat(_) | IoError::DateFormat(_) => EXIT_USAGE,
    }
}
