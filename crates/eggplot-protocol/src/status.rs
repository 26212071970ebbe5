//! Print status reconciliation.
//!
//! The device is the source of truth: the client mirrors whatever the live
//! feed reports by shallow-merging partial status messages into the current
//! state. No transition legality is enforced.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reported device state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintState {
    /// Idle, nothing printing
    #[default]
    Stopped,
    /// Actively executing instructions
    Printing,
    /// Paused, e.g. waiting for a pen change
    Paused,
}

impl fmt::Display for PrintState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Printing => write!(f, "printing"),
            Self::Paused => write!(f, "paused"),
        }
    }
}

/// The reconciled print status.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintStatus {
    /// Current device state
    pub status: PrintState,
    /// Name of the file being printed, if any
    pub file_name: Option<String>,
    /// Raw progress: index of the instruction line being executed
    pub progress: usize,
    /// What the device is waiting on (e.g. a pen color), empty when none
    pub waiting_for: String,
}

impl PrintStatus {
    /// Shallow-merges a partial update: only the fields present in the
    /// message overwrite, everything else persists.
    pub fn apply(&mut self, update: &PrintStatusUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(file_name) = &update.file_name {
            self.file_name = Some(file_name.clone());
        }
        if let Some(progress) = update.progress {
            self.progress = progress;
        }
        if let Some(waiting_for) = &update.waiting_for {
            self.waiting_for = waiting_for.clone();
        }
    }

    /// True unless the device reports stopped; gates navigation away from
    /// the print view.
    pub fn is_printing(&self) -> bool {
        self.status != PrintState::Stopped
    }
}

/// A partial status message from the live feed. Absent fields mean
/// "unchanged".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintStatusUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PrintState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiting_for: Option<String>,
}

impl PrintStatusUpdate {
    /// Parses one feed message.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
