//! In-memory timing-source implementation.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use super::{SyncError, SyncSource};

/// Per-line rising/falling edge arrays.
#[derive(Debug, Clone, Default)]
struct LineEdges {
    rising: Vec<f64>,
    falling: Vec<f64>,
}

/// An in-memory timing-signal recording.
///
/// This is the already-parsed structure the core consumes: whatever reads
/// the timing container on disk only has to fill one of these.
#[derive(Debug, Clone)]
pub struct EdgeTable {
    id: String,
    start_time: NaiveDateTime,
    lines: BTreeMap<String, LineEdges>,
}

impl EdgeTable {
    /// Create an empty table with a stable identity and recording start.
    pub fn new(id: impl Into<String>, start_time: NaiveDateTime) -> Self {
        Self {
            id: id.into(),
            start_time,
            lines: BTreeMap::new(),
        }
    }

    /// Add a line with its rising and falling edge times (seconds).
    pub fn with_line(
        mut self,
        label: impl Into<String>,
        rising: Vec<f64>,
        falling: Vec<f64>,
    ) -> Self {
        self.insert_line(label, rising, falling);
        self
    }

    /// Add or replace a line in place.
    pub fn insert_line(&mut self, label: impl Into<String>, rising: Vec<f64>, falling: Vec<f64>) {
        self.lines
            .insert(label.into(), LineEdges { rising, falling });
    }

    fn line(&self, label: &str) -> Result<&LineEdges, SyncError> {
        self.lines
            .get(label)
            .ok_or_else(|| SyncError::LineNotFound(label.to_string()))
    }
}

impl SyncSource for EdgeTable {
    fn source_id(&self) -> &str {
        &self.id
    }

    fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    fn line_labels(&self) -> Vec<String> {
        self.lines.keys().cloned().collect()
    }

    fn rising_edges(&self, line: &str) -> Result<Vec<f64>, SyncError> {
        Ok(self.line(line)?.rising.clone())
    }

    fn falling_edges(&self, line: &str) -> Result<Vec<f64>, SyncError> {
        Ok(self.line(line)?.falling.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDateTime {
        "2023-08-03T12:04:15".parse().unwrap()
    }

    #[test]
    fn returns_edges_for_known_line() {
        let table = EdgeTable::new("sync-a", start()).with_line(
            "beh_cam_exposing",
            vec![0.1, 0.2],
            vec![0.15, 0.25],
        );
        assert_eq!(
            table.rising_edges("beh_cam_exposing").unwrap(),
            vec![0.1, 0.2]
        );
        assert_eq!(
            table.falling_edges("beh_cam_exposing").unwrap(),
            vec![0.15, 0.25]
        );
    }

    #[test]
    fn missing_line_is_an_error() {
        let table = EdgeTable::new("sync-a", start());
        assert!(matches!(
            table.rising_edges("lick_sensor"),
            Err(SyncError::LineNotFound(_))
        ));
        assert!(!table.has_line("lick_sensor"));
    }

    #[test]
    fn lists_line_labels() {
        let table = EdgeTable::new("sync-a", start())
            .with_line("eye_cam_exposing", vec![], vec![])
            .with_line("lick_sensor", vec![], vec![]);
        let labels = table.line_labels();
        assert!(labels.contains(&"eye_cam_exposing".to_string()));
        assert!(labels.contains(&"lick_sensor".to_string()));
        assert!(table.has_line("lick_sensor"));
    }
}
