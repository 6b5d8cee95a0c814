use crate::data::{Segment, SegmentPlan};
use crate::error::{Error, Result};

/// Partition `total_size` bytes into contiguous inclusive ranges.
///
/// Every segment holds `ceil(total_size / segment_count)` bytes except the
/// last, which holds the remainder. Segments that would start past the end
/// of the resource are not emitted, so tiny resources yield fewer segments
/// than requested. An empty resource yields an empty plan.
///
/// # Examples
///
/// ```
/// use segfetch::core::plan_segments;
///
/// let plan = plan_segments(10, 3).unwrap();
/// assert_eq!(plan.bytes_per_segment, 4);
/// let bounds: Vec<_> = plan.iter().map(|s| (s.start, s.end)).collect();
/// assert_eq!(bounds, [(0, 3), (4, 7), (8, 9)]);
/// ```
pub fn plan_segments(total_size: u64, segment_count: u32) -> Result<SegmentPlan> {
    if segment_count == 0 {
        return Err(Error::InvalidSegmentCount);
    }

    let bytes_per_segment = total_size.div_ceil(u64::from(segment_count));
    // sized by what is emitted, not by what was asked for
    let emitted = if bytes_per_segment == 0 { 0 } else { total_size.div_ceil(bytes_per_segment) };
    let mut segments = Vec::with_capacity(usize::try_from(emitted).unwrap_or(0));

    if bytes_per_segment > 0 {
        let mut start = 0;
        let mut id = 1;
        while start < total_size {
            let end = start.saturating_add(bytes_per_segment).min(total_size) - 1;
            segments.push(Segment { id, start, end });
            start = end + 1;
            id += 1;
        }
    }

    Ok(SegmentPlan {
        total_size,
        requested: segment_count,
        bytes_per_segment,
        segments,
    })
}
