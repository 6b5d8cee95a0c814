use std::fmt;

/// One contiguous byte range of the resource assigned to one worker.
///
/// The plan is immutable. Bytes fetched so far for a segment live in its
/// worker's write cursor (`cursor - start`), are streamed out as
/// [`ProgressEvent::segment_bytes_downloaded`](crate::ProgressEvent) and end
/// up in [`SegmentReport::bytes_downloaded`](crate::SegmentReport).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Segment id (1-based)
    pub id:    u32,
    /// First byte offset
    pub start: u64,
    /// Last byte offset (inclusive)
    pub end:   u64,
}

impl Segment {
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 { self.end - self.start + 1 }

    pub fn range(&self) -> ByteRange {
        ByteRange {
            start: self.start,
            end:   self.end,
        }
    }
}

/// Inclusive byte range as sent in a `Range` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end:   u64,
}

impl ByteRange {
    /// Value for the `Range` request header.
    ///
    /// ```
    /// use segfetch::ByteRange;
    ///
    /// assert_eq!(ByteRange { start: 25, end: 49 }.header_value(), "bytes=25-49");
    /// ```
    pub fn header_value(&self) -> String { format!("bytes={}-{}", self.start, self.end) }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Output of the planner: the ordered segments of one download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentPlan {
    pub total_size:        u64,
    /// Segment count the caller asked for.
    pub requested:         u32,
    /// `ceil(total_size / requested)`
    pub bytes_per_segment: u64,
    pub segments:          Vec<Segment>,
}

impl SegmentPlan {
    /// Number of segments actually emitted. Can be lower than `requested`
    /// when the resource is too small to give every segment a byte.
    pub fn segment_count(&self) -> u32 { self.segments.len() as u32 }

    /// Length of the final segment, which may be shorter than the others.
    pub fn last_segment_len(&self) -> u64 { self.segments.last().map_or(0, Segment::len) }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> { self.segments.iter() }
}
