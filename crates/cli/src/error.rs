//! CLI error type: everything here is fatal at startup, before the
//! evaluation loop begins.

use runout_core::RunoutError;

/// Errors raised by the command-line surface.
#[derive(Debug)]
pub enum CliError {
    /// Core library rejected the configuration or grid
    Core(RunoutError),
    /// DEM file could not be read
    DemRead(String),
    /// DEM file is not a valid ASCII grid
    DemParse(String),
    /// Trigger file could not be read
    TriggerRead(String),
    /// Trigger file is not usable GeoJSON
    TriggerParse(String),
    /// Trigger and DEM coordinate systems cannot be combined
    CrsMismatch {
        /// The DEM's CRS identifier
        grid: String,
        /// What the trigger projection would produce
        triggers: String,
    },
    /// Output mask could not be written
    MaskWrite(String),
    /// A command-line argument has an unusable value
    InvalidArgument(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Core(err) => write!(f, "{err}"),
            CliError::DemRead(msg) => write!(f, "Failed to read DEM: {msg}"),
            CliError::DemParse(msg) => write!(f, "Failed to parse DEM: {msg}"),
            CliError::TriggerRead(msg) => write!(f, "Failed to read triggers: {msg}"),
            CliError::TriggerParse(msg) => write!(f, "Failed to parse triggers: {msg}"),
            CliError::CrsMismatch { grid, triggers } => {
                write!(
                    f,
                    "Trigger projection produces {triggers} but the DEM is in {grid}; \
                     reproject the DEM or pass pre-projected triggers with --trigger-crs grid"
                )
            }
            CliError::MaskWrite(msg) => write!(f, "Failed to write mask: {msg}"),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Core(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RunoutError> for CliError {
    fn from(err: RunoutError) -> Self {
        CliError::Core(err)
    }
}
