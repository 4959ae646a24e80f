//! Storage-key encoding and decoding for point records.
//!
//! Keys sort first by series, then by time, in ascending byte order:
//!
//! Point key: [series_id: u32 BE][timestamp: sign-flipped u64 BE]
//!
//! A forward range scan over a fixed series prefix therefore yields samples
//! in chronological order without a secondary index. The timestamp is mapped
//! to an unsigned offset-binary representation (sign bit flipped) so that
//! pre-epoch (negative) timestamps still sort before post-epoch ones under
//! lexicographic comparison. Byte order is big-endian everywhere and must
//! stay consistent across a deployment; mixing byte orders corrupts key
//! ordering.

use crate::error::{Error, Result};

/// Length in bytes of an encoded point key.
pub const POINT_KEY_LEN: usize = 12;

/// Encodes a point key with the format: [series_id][order-preserving timestamp]
///
/// # Arguments
/// * `series_id` - The series identifier
/// * `timestamp` - Sample time in nanoseconds since the Unix epoch
///
/// # Returns
/// Fixed-width encoded key bytes
pub fn point_key(series_id: u32, timestamp: i64) -> [u8; POINT_KEY_LEN] {
    let mut key = [0u8; POINT_KEY_LEN];
    key[..4].copy_from_slice(&series_id.to_be_bytes());
    key[4..].copy_from_slice(&order_preserving(timestamp).to_be_bytes());
    key
}

/// Builds the inclusive key bounds for scanning one series over `[from, to]`.
pub fn series_scan_range(
    series_id: u32,
    from: i64,
    to: i64,
) -> ([u8; POINT_KEY_LEN], [u8; POINT_KEY_LEN]) {
    (point_key(series_id, from), point_key(series_id, to))
}

/// Builds the inclusive key bounds covering every point of one series.
pub fn series_prefix_range(series_id: u32) -> ([u8; POINT_KEY_LEN], [u8; POINT_KEY_LEN]) {
    series_scan_range(series_id, i64::MIN, i64::MAX)
}

/// Decodes a point key back into its series identifier and timestamp.
///
/// # Returns
/// Tuple of (series_id, timestamp), or `CorruptRecord` on a malformed key
pub fn decode_point_key(key: &[u8]) -> Result<(u32, i64)> {
    if key.len() != POINT_KEY_LEN {
        return Err(Error::CorruptRecord(format!(
            "point key must be {} bytes, got {}",
            POINT_KEY_LEN,
            key.len()
        )));
    }

    let series_id = u32::from_be_bytes(key[..4].try_into().unwrap());
    let raw = u64::from_be_bytes(key[4..].try_into().unwrap());
    Ok((series_id, from_order_preserving(raw)))
}

/// Maps a signed timestamp to an unsigned value with the same ordering.
fn order_preserving(timestamp: i64) -> u64 {
    (timestamp as u64) ^ (1 << 63)
}

fn from_order_preserving(raw: u64) -> i64 {
    (raw ^ (1 << 63)) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_key_round_trip() {
        for timestamp in [i64::MIN, -1, 0, 1, 1_700_000_000_000_000_000, i64::MAX] {
            let key = point_key(42, timestamp);
            assert_eq!(decode_point_key(&key).unwrap(), (42, timestamp));
        }
    }

    #[test]
    fn test_keys_sort_by_series_then_time() {
        // Byte order must match (series, timestamp) order across sign changes.
        let ordered = [
            point_key(1, i64::MIN),
            point_key(1, -5),
            point_key(1, 0),
            point_key(1, 7),
            point_key(1, i64::MAX),
            point_key(2, i64::MIN),
            point_key(2, 0),
        ];

        for pair in ordered.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_prefix_range_covers_series() {
        let (low, high) = series_prefix_range(9);
        let key = point_key(9, -1234);
        assert!(low <= key && key <= high);

        let other = point_key(10, i64::MIN);
        assert!(other > high);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert!(decode_point_key(&[0u8; 4]).is_err());
        assert!(decode_point_key(&[0u8; 13]).is_err());
    }
}
