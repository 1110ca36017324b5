//! Datagram payload decoding.
//!
//! Payloads are UTF-8 text with no header, length prefix, or framing beyond
//! the datagram boundary itself:
//!
//! ```text
//! single:  "x,y,z"
//! dual:    "x1,y1,z1|x2,y2,z2"
//! ```
//!
//! Each field is a decimal number with `.` as the decimal separator. Rust's
//! float parsing is locale-independent by definition, so the sender's and
//! receiver's host locales never affect the result.
//!
//! A datagram either decodes completely or not at all: any bad field fails
//! the whole payload with a [`DecodeError`] and no track point is updated
//! from it. There is no fallback value for a failed parse, since a
//! substituted origin reading would be indistinguishable from real data.

use crate::types::{TrackMode, Vec3};

/// Decode failure for a single datagram.
///
/// Recovered locally by the ingest loop: the datagram is dropped, counted,
/// and logged, and the loop continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Payload bytes are not valid UTF-8
    #[error("payload is not valid UTF-8")]
    NotUtf8,

    /// Payload is empty after trimming
    #[error("empty payload")]
    Empty,

    /// `|`-split produced the wrong number of point segments for the mode
    #[error("expected {expected} point segment(s), got {actual}")]
    SegmentCount {
        /// Segment count the configured mode requires
        expected: usize,
        /// Segment count found in the payload
        actual: usize,
    },

    /// A segment did not split into exactly three comma-separated fields
    #[error("segment {segment} has {count} field(s), expected 3")]
    FieldCount {
        /// Zero-based segment index
        segment: usize,
        /// Fields found in the segment
        count: usize,
    },

    /// A field failed numeric parsing or was not finite
    #[error("segment {segment} field {field} is not a finite number: {text:?}")]
    InvalidNumber {
        /// Zero-based segment index
        segment: usize,
        /// Zero-based field index within the segment
        field: usize,
        /// Offending field text
        text: String,
    },
}

/// Decode a datagram payload into one coordinate triple per point.
///
/// The returned triples are in payload order: in dual mode, index 0 is the
/// first `|`-segment and index 1 the second. The payload is trimmed once as
/// a whole (tolerates a trailing newline from casual senders); fields
/// themselves are parsed strictly.
pub fn decode(payload: &[u8], mode: TrackMode) -> Result<Vec<Vec3>, DecodeError> {
    let text = std::str::from_utf8(payload).map_err(|_| DecodeError::NotUtf8)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(DecodeError::Empty);
    }

    let segments: Vec<&str> = text.split('|').collect();
    if segments.len() != mode.point_count() {
        return Err(DecodeError::SegmentCount {
            expected: mode.point_count(),
            actual: segments.len(),
        });
    }

    let mut triples = Vec::with_capacity(segments.len());
    for (segment_idx, segment) in segments.iter().enumerate() {
        triples.push(decode_triple(segment, segment_idx)?);
    }
    Ok(triples)
}

/// Decode one `"x,y,z"` segment.
fn decode_triple(segment: &str, segment_idx: usize) -> Result<Vec3, DecodeError> {
    let fields: Vec<&str> = segment.split(',').collect();
    if fields.len() != 3 {
        return Err(DecodeError::FieldCount {
            segment: segment_idx,
            count: fields.len(),
        });
    }

    let mut parsed = [0.0f32; 3];
    for (field_idx, field) in fields.iter().enumerate() {
        let value: f32 = field
            .parse()
            .map_err(|_| DecodeError::InvalidNumber {
                segment: segment_idx,
                field: field_idx,
                text: (*field).to_string(),
            })?;
        // "inf" and "nan" parse as floats but are never legitimate readings
        if !value.is_finite() {
            return Err(DecodeError::InvalidNumber {
                segment: segment_idx,
                field: field_idx,
                text: (*field).to_string(),
            });
        }
        parsed[field_idx] = value;
    }
    Ok(Vec3::new(parsed[0], parsed[1], parsed[2]))
}
