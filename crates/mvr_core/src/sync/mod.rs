//! Timing-source collaborator interface.
//!
//! The timing source is a hardware event recorder producing named digital-line
//! rising/falling edge timestamps on a shared clock. Parsing its container
//! format is out of scope for this crate; the core consumes already-parsed
//! edge arrays through the [`SyncSource`] trait. [`EdgeTable`] is the
//! provided in-memory implementation.

mod edge_table;

use chrono::NaiveDateTime;

pub use edge_table::EdgeTable;

/// Errors raised by a timing source.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The requested digital line does not exist in the recording.
    #[error("sync line '{0}' not present in timing source")]
    LineNotFound(String),
}

/// A readable timing-signal recording.
///
/// Edge getters return ordered timestamps in seconds on the sync clock.
pub trait SyncSource {
    /// Stable identity of this recording, used as a cache key.
    fn source_id(&self) -> &str;

    /// Wall-clock time the timing recording started.
    fn start_time(&self) -> NaiveDateTime;

    /// Labels of all digital lines in the recording.
    fn line_labels(&self) -> Vec<String>;

    /// Rising-edge times of a line, ascending seconds.
    fn rising_edges(&self, line: &str) -> Result<Vec<f64>, SyncError>;

    /// Falling-edge times of a line, ascending seconds.
    fn falling_edges(&self, line: &str) -> Result<Vec<f64>, SyncError>;

    /// Whether the recording contains a line with this label.
    fn has_line(&self, line: &str) -> bool {
        self.line_labels().iter().any(|label| label == line)
    }
}
