//! Typed ingestion of the per-camera metadata sidecar.
//!
//! The recorder writes one JSON sidecar per video, with the fields of
//! interest under a `RecordingReport` envelope. Ingestion validates shapes
//! and converts units once, here, so the rest of the crate works with typed
//! values only. In particular, lost-frame indices are 1-based in the sidecar
//! and 0-based everywhere inside this crate: the `- 1` happens at this
//! boundary and nowhere else.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while ingesting a metadata sidecar.
///
/// All of these are fatal at the point of use: this is a data-quality
/// detector, so malformed input propagates immediately with no retry.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The sidecar JSON could not be parsed into the expected shape.
    #[error("failed to parse recording report: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is absent.
    #[error("recording report field '{0}' is missing")]
    MissingField(&'static str),

    /// A lost-frame span descriptor could not be parsed.
    #[error("unparsable lost-frame span '{span}'")]
    UnparsableSpan { span: String },

    /// A lost-frame index was outside the 1-based range the sidecar uses.
    #[error("lost-frame index {index} is out of range (sidecar indices are 1-based)")]
    LostFrameIndexOutOfRange { index: u64 },

    /// The recording start time could not be parsed.
    #[error("unparsable recording start time '{value}'")]
    UnparsableTimestamp { value: String },

    /// A barcode coordinate entry was missing or not an integer.
    #[error("barcode coordinate '{key}' has unusable value '{value}'")]
    UnparsableCoordinate { key: &'static str, value: String },

    /// The lick-sensor input encoding could not be parsed.
    #[error("unparsable camera input encoding: {0}")]
    UnparsableCameraInput(String),

    /// The session was recorded without lick-sensor input.
    #[error("lick sensor input was not recorded for this session")]
    LickInputNotRecorded,
}

/// Pixel geometry of the barcode imprint, as declared in the sidecar.
///
/// The default matches the recorder's values for sidecars that omit
/// `BarcodeCoordinates`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodeGeometry {
    pub x_offset: u32,
    pub y_offset: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for BarcodeGeometry {
    fn default() -> Self {
        Self {
            x_offset: 0,
            y_offset: 0,
            width: 129,
            height: 3,
        }
    }
}

/// Raw sidecar shape, exactly as the recorder writes it.
#[derive(Debug, Deserialize)]
struct RawReport {
    #[serde(rename = "FramesRecorded")]
    frames_recorded: u64,

    #[serde(rename = "FramesLostCount")]
    frames_lost_count: u64,

    /// Lost-frame span descriptors, 1-indexed, e.g. `["1-2,4-5,7"]`.
    #[serde(rename = "LostFrames", default)]
    lost_frames: Vec<String>,

    #[serde(rename = "FPS")]
    fps: f64,

    /// ISO timestamp with a trailing `Z`, e.g. `2023-08-03T12:04:15.000Z`.
    #[serde(rename = "TimeStart")]
    time_start: String,

    /// Fingerprint initial exposure duration in milliseconds, deliberately
    /// distinct per camera so wiring can be identified from the sync record.
    #[serde(rename = "CustomInitialExposureTime")]
    custom_initial_exposure_ms: f64,

    /// String-valued pixel offsets, as the recorder writes them.
    #[serde(rename = "BarcodeCoordinates", default)]
    barcode_coordinates: Option<serde_json::Map<String, Value>>,

    /// `"true"` when the recorder imprinted frame-id barcodes.
    #[serde(rename = "FrameID imprint enabled", default)]
    frame_id_imprint_enabled: Option<Value>,

    /// Digital lick-sensor transitions, `["<state pairs>"]`.
    #[serde(rename = "CameraInput", default)]
    camera_input: Option<Vec<String>>,
}

/// Validated per-camera metadata.
#[derive(Debug, Clone, Serialize)]
pub struct VideoMetadata {
    /// Data frames written by the recorder (excludes the metadata frame).
    pub frames_recorded: u64,
    /// Declared number of frames lost during acquisition.
    pub frames_lost_count: u64,
    /// Lost-frame positions, 0-indexed.
    pub lost_frames: Vec<usize>,
    /// Declared nominal frame rate, frames per second.
    pub fps: f64,
    /// Wall-clock recording start (naive; sidecar timezone suffix discarded).
    pub start_time: NaiveDateTime,
    /// Fingerprint initial exposure duration, milliseconds.
    pub initial_exposure_ms: f64,
    /// Barcode imprint pixel geometry.
    pub barcode_geometry: BarcodeGeometry,
    /// Whether frame-id barcodes were imprinted.
    pub barcode_imprint_enabled: bool,
    /// Raw lick-sensor encoding, when present.
    pub camera_input: Option<Vec<String>>,
}

impl VideoMetadata {
    /// Ingest a sidecar from its JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, MetadataError> {
        Self::from_json_value(serde_json::from_str(text)?)
    }

    /// Ingest a sidecar from a parsed JSON value, with or without the
    /// `RecordingReport` envelope.
    pub fn from_json_value(mut value: Value) -> Result<Self, MetadataError> {
        if let Some(report) = value.get_mut("RecordingReport") {
            value = report.take();
        }
        let raw: RawReport = serde_json::from_value(value)?;

        let lost_frames = if raw.frames_lost_count == 0 {
            Vec::new()
        } else if raw.lost_frames.is_empty() {
            return Err(MetadataError::MissingField("LostFrames"));
        } else {
            expand_lost_frame_spans(&raw.lost_frames)?
        };

        let start_time = parse_start_time(&raw.time_start)?;
        let barcode_geometry = match &raw.barcode_coordinates {
            Some(coordinates) => parse_barcode_coordinates(coordinates)?,
            None => BarcodeGeometry::default(),
        };
        let barcode_imprint_enabled = match &raw.frame_id_imprint_enabled {
            Some(Value::String(s)) => s == "true",
            Some(Value::Bool(b)) => *b,
            _ => false,
        };

        Ok(Self {
            frames_recorded: raw.frames_recorded,
            frames_lost_count: raw.frames_lost_count,
            lost_frames,
            fps: raw.fps,
            start_time,
            initial_exposure_ms: raw.custom_initial_exposure_ms,
            barcode_geometry,
            barcode_imprint_enabled,
            camera_input: raw.camera_input,
        })
    }

    /// Total physical frames expected in the video file: recorded data
    /// frames plus the prepended metadata frame.
    pub fn total_frames(&self) -> u64 {
        self.frames_recorded + 1
    }

    /// Declared lost frames as a percentage of recorded frames.
    pub fn lost_frame_percentage(&self) -> f64 {
        100.0 * self.frames_lost_count as f64 / self.frames_recorded as f64
    }
}

/// Expand 1-indexed lost-frame span descriptors into 0-indexed positions.
///
/// A span `"a-b"` denotes the inclusive range `a..=b`; a bare `"a"` denotes
/// the single index `a`. Spans are comma-separated within each descriptor
/// and indices are collected across all descriptors.
pub fn expand_lost_frame_spans(spans: &[String]) -> Result<Vec<usize>, MetadataError> {
    let mut lost = Vec::new();
    for descriptor in spans {
        for span in descriptor.split(',') {
            let span = span.trim();
            let mut bounds = span.splitn(2, '-');
            let start = parse_span_index(bounds.next().unwrap_or_default(), span)?;
            match bounds.next() {
                None => lost.push(to_zero_indexed(start)?),
                Some(end) => {
                    let end = parse_span_index(end, span)?;
                    for index in start..=end {
                        lost.push(to_zero_indexed(index)?);
                    }
                }
            }
        }
    }
    Ok(lost)
}

fn parse_span_index(text: &str, span: &str) -> Result<u64, MetadataError> {
    text.trim()
        .parse::<u64>()
        .map_err(|_| MetadataError::UnparsableSpan {
            span: span.to_string(),
        })
}

fn to_zero_indexed(index: u64) -> Result<usize, MetadataError> {
    index
        .checked_sub(1)
        .map(|i| i as usize)
        .ok_or(MetadataError::LostFrameIndexOutOfRange { index })
}

fn parse_start_time(value: &str) -> Result<NaiveDateTime, MetadataError> {
    value
        .strip_suffix('Z')
        .unwrap_or(value)
        .parse::<NaiveDateTime>()
        .map_err(|_| MetadataError::UnparsableTimestamp {
            value: value.to_string(),
        })
}

fn parse_barcode_coordinates(
    coordinates: &serde_json::Map<String, Value>,
) -> Result<BarcodeGeometry, MetadataError> {
    let field = |key: &'static str| -> Result<u32, MetadataError> {
        let value = coordinates
            .get(key)
            .ok_or(MetadataError::MissingField("BarcodeCoordinates"))?;
        let parsed = match value {
            Value::String(s) => s.trim().parse::<u32>().ok(),
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            _ => None,
        };
        parsed.ok_or_else(|| MetadataError::UnparsableCoordinate {
            key,
            value: value.to_string(),
        })
    };
    Ok(BarcodeGeometry {
        x_offset: field("xOffset")?,
        y_offset: field("yOffset")?,
        width: field("width")?,
        height: field("height")?,
    })
}

/// Parse the lick-sensor `CameraInput` encoding into event timestamps.
///
/// The encoding is a `"1,0"` header pair followed by `(value, state)` pairs;
/// values at rising (`1`) states are the lick events. A bare `["1,0"]` means
/// the sensor was not recorded.
pub fn parse_camera_input(values: &[String]) -> Result<Vec<u64>, MetadataError> {
    let encoded = match values.first() {
        Some(first) if !(values.len() == 1 && first == "1,0") => first,
        _ => return Err(MetadataError::LickInputNotRecorded),
    };

    let numbers: Vec<u64> = encoded
        .split(',')
        .map(|part| part.trim().parse::<u64>())
        .collect::<Result<_, _>>()
        .map_err(|_| MetadataError::UnparsableCameraInput(encoded.clone()))?;
    if numbers.len() < 2 || numbers.len() % 2 != 0 {
        return Err(MetadataError::UnparsableCameraInput(encoded.clone()));
    }

    // Skip the header pair, then keep values whose state is high.
    Ok(numbers[2..]
        .chunks(2)
        .filter(|pair| pair[1] == 1)
        .map(|pair| pair[0])
        .collect())
}
