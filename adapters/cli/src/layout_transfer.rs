//! Shareable single-line encoding of a gem layout.
//!
//! The format is `gems:v1:<columns>x<rows>:<base64 payload>`, where the
//! payload is the JSON list of placements. Players trade these strings to
//! reproduce each other's boards.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use gem_defence_core::{GemTypeId, GridCell};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SNAPSHOT_DOMAIN: &str = "gems";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded payload.
pub(crate) const SNAPSHOT_HEADER: &str = "gems:v1";
/// Delimiter separating the prefix, grid dimensions, and payload.
const FIELD_DELIMITER: char = ':';

/// Snapshot of the gems placed on a board and the grid dimensions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct GemLayoutSnapshot {
    /// Number of grid columns the layout was built on.
    pub(crate) columns: u32,
    /// Number of grid rows the layout was built on.
    pub(crate) rows: u32,
    /// Placements in the order they should be rebuilt.
    pub(crate) gems: Vec<GemPlacement>,
}

/// Single placement captured within a layout snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct GemPlacement {
    /// Gem type socketed at the cell.
    pub(crate) gem: GemTypeId,
    /// Cell the gem occupies.
    pub(crate) cell: GridCell,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializablePayload {
    gems: Vec<GemPlacement>,
}

impl GemLayoutSnapshot {
    /// Encodes the snapshot into a single-line shareable string.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let payload = SerializablePayload {
            gems: self.gems.clone(),
        };
        let json = serde_json::to_vec(&payload).expect("layout snapshot serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!("{SNAPSHOT_HEADER}:{}x{}:{encoded}", self.columns, self.rows)
    }

    /// Decodes a snapshot from its string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LayoutTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(LayoutTransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(LayoutTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(LayoutTransferError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LayoutTransferError::InvalidEncoding)?;
        let decoded: SerializablePayload =
            serde_json::from_slice(&bytes).map_err(LayoutTransferError::InvalidPayload)?;

        Ok(Self {
            columns,
            rows,
            gems: decoded.gems,
        })
    }
}

/// Errors that can occur while decoding layout share strings.
#[derive(Debug, Error)]
pub(crate) enum LayoutTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("layout string was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the encoded snapshot.
    #[error("layout string is missing the prefix")]
    MissingPrefix,
    /// The encoded snapshot did not contain a version segment.
    #[error("layout string is missing the version")]
    MissingVersion,
    /// The encoded snapshot did not include grid dimensions.
    #[error("layout string is missing the grid dimensions")]
    MissingDimensions,
    /// The encoded snapshot did not include the payload segment.
    #[error("layout string is missing the payload")]
    MissingPayload,
    /// The encoded snapshot used an unexpected prefix segment.
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode layout payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The decoded payload could not be deserialized.
    #[error("could not parse layout payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LayoutTransferError> {
    let invalid = || LayoutTransferError::InvalidDimensions(dimensions.to_owned());
    let parse_axis = |axis: &str| axis.trim().parse::<u32>().ok().filter(|value| *value > 0);

    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;
    match (parse_axis(columns), parse_axis(rows)) {
        (Some(columns), Some(rows)) => Ok((columns, rows)),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_empty_layout() {
        let snapshot = GemLayoutSnapshot {
            columns: 22,
            rows: 15,
            gems: Vec::new(),
        };

        let encoded = snapshot.encode();
        assert!(encoded.starts_with(&format!("{SNAPSHOT_HEADER}:22x15:")));

        let decoded = GemLayoutSnapshot::decode(&encoded).expect("snapshot decodes");
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn round_trip_populated_layout() {
        let snapshot = GemLayoutSnapshot {
            columns: 22,
            rows: 15,
            gems: vec![
                GemPlacement {
                    gem: GemTypeId::new(1),
                    cell: GridCell::new(5, 7),
                },
                GemPlacement {
                    gem: GemTypeId::new(8),
                    cell: GridCell::new(12, 4),
                },
            ],
        };

        let encoded = snapshot.encode();
        let decoded = GemLayoutSnapshot::decode(&encoded).expect("snapshot decodes");
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn unknown_domains_and_versions_are_rejected() {
        assert!(matches!(
            GemLayoutSnapshot::decode("loot:v1:4x4:e30"),
            Err(LayoutTransferError::InvalidPrefix(_))
        ));
        assert!(matches!(
            GemLayoutSnapshot::decode("gems:v9:4x4:e30"),
            Err(LayoutTransferError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn malformed_dimensions_and_payloads_are_rejected() {
        assert!(matches!(
            GemLayoutSnapshot::decode("gems:v1:4by4:e30"),
            Err(LayoutTransferError::InvalidDimensions(_))
        ));
        assert!(matches!(
            GemLayoutSnapshot::decode("gems:v1:4x4:!!!"),
            Err(LayoutTransferError::InvalidEncoding(_))
        ));
        assert!(matches!(
            GemLayoutSnapshot::decode(""),
            Err(LayoutTransferError::EmptyPayload)
        ));
    }
}
