use crate::effects::ProbeResponse;
use crate::error::ProbeError;

/// HTTP status a probe must answer with.
pub const PROBE_STATUS: u16 = 200;

/// HTTP status a range request must answer with.
pub const PARTIAL_CONTENT: u16 = 206;

/// Returns `true` if an `Accept-Ranges` value lists the `bytes` unit.
///
/// # Examples
///
/// ```
/// use segfetch::core::accepts_byte_ranges;
///
/// assert!(accepts_byte_ranges("bytes"));
/// assert!(accepts_byte_ranges("none, Bytes"));
/// assert!(!accepts_byte_ranges("none"));
/// ```
pub fn accepts_byte_ranges(value: &str) -> bool {
    value
        .split(',')
        .any(|unit| unit.trim().eq_ignore_ascii_case("bytes"))
}

/// Evaluate a probe response and return the resource size.
pub fn check_probe(response: &ProbeResponse) -> Result<u64, ProbeError> {
    if response.status != PROBE_STATUS {
        return Err(ProbeError::StatusMismatch {
            actual: response.status,
        });
    }

    let total_size = response.content_length.ok_or(ProbeError::MissingLength)?;

    match response.accept_ranges.as_deref() {
        Some(value) if accepts_byte_ranges(value) => Ok(total_size),
        _ => Err(ProbeError::RangeUnsupported),
    }
}

/// Parse a `Content-Length` header value.
pub fn parse_content_length(value: &str) -> Option<u64> { value.trim().parse().ok() }

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, len: Option<u64>, ranges: Option<&str>) -> ProbeResponse {
        ProbeResponse {
            status,
            content_length: len,
            accept_ranges: ranges.map(str::to_string),
        }
    }

    #[test]
    fn test_probe_ok() {
        assert_eq!(check_probe(&response(200, Some(1024), Some("bytes"))), Ok(1024));
    }

    #[test]
    fn test_probe_zero_length_is_valid() {
        assert_eq!(check_probe(&response(200, Some(0), Some("bytes"))), Ok(0));
    }

    #[test]
    fn test_probe_status_mismatch() {
        assert_eq!(
            check_probe(&response(404, Some(1024), Some("bytes"))),
            Err(ProbeError::StatusMismatch { actual: 404 })
        );
        // a redirect that was not followed is still a mismatch
        assert_eq!(
            check_probe(&response(302, None, None)),
            Err(ProbeError::StatusMismatch { actual: 302 })
        );
    }

    #[test]
    fn test_probe_missing_length() {
        assert_eq!(
            check_probe(&response(200, None, Some("bytes"))),
            Err(ProbeError::MissingLength)
        );
    }

    #[test]
    fn test_probe_range_unsupported() {
        assert_eq!(
            check_probe(&response(200, Some(10), Some("none"))),
            Err(ProbeError::RangeUnsupported)
        );
        assert_eq!(
            check_probe(&response(200, Some(10), None)),
            Err(ProbeError::RangeUnsupported)
        );
    }

    #[test]
    fn test_status_checked_before_headers() {
        assert_eq!(
            check_probe(&response(500, None, None)),
            Err(ProbeError::StatusMismatch { actual: 500 })
        );
    }

    #[test]
    fn test_parse_content_length() {
        assert_eq!(parse_content_length(" 42 "), Some(42));
        assert_eq!(parse_content_length("-1"), None);
        assert_eq!(parse_content_length("abc"), None);
    }
}
