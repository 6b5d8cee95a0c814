use std::sync::atomic::{AtomicU64, Ordering};

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use once_cell::sync::Lazy;
use segfetch::{ProgressEvent, ProgressSink, SegmentPlan};

const PB_STYLE: &str = "{spinner:.blue} {prefix:>8.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    let pb_style = match ProgressStyle::with_template(PB_STYLE) {
        Ok(pb_style) => pb_style.tick_chars(TICK).progress_chars(PB_CHARS),
        Err(_) => return None,
    };

    Some(pb_style)
});

#[derive(Debug, Clone, Default)]
pub struct BarBuilder {
    len:    u64,
    prefix: String,
}

impl BarBuilder {
    pub fn with_len(mut self, len: u64) -> Self {
        self.len = len;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn build(self) -> ProgressBar {
        let pb = ProgressBar::new(self.len);
        let pb = if let Some(style) = PB_TEMPLATE.as_ref() {
            pb.with_style(style.clone())
        } else {
            pb
        };
        pb.set_prefix(self.prefix);
        pb
    }
}

/// A "Total" bar plus one bar per segment.
pub struct SegmentTracker {
    _multi:   MultiProgress,
    total:    ProgressBar,
    segments: Vec<ProgressBar>,
    high:     AtomicU64,
}

impl SegmentTracker {
    pub fn new(plan: &SegmentPlan, hidden: bool) -> Self {
        let multi = if hidden {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };

        let total = multi.add(
            BarBuilder::default()
                .with_len(plan.total_size)
                .with_prefix("Total")
                .build(),
        );
        let segments = plan
            .iter()
            .map(|segment| {
                multi.add(
                    BarBuilder::default()
                        .with_len(segment.len())
                        .with_prefix(segment.id.to_string())
                        .build(),
                )
            })
            .collect();

        Self {
            _multi: multi,
            total,
            segments,
            high: AtomicU64::new(0),
        }
    }

    pub fn finish(&self, msg: &str) {
        for pb in &self.segments {
            pb.finish_and_clear();
        }
        self.total.finish_with_message(msg.to_string());
    }

    pub fn abandon(&self, msg: &str) {
        for pb in &self.segments {
            pb.abandon();
        }
        self.total.abandon_with_message(msg.to_string());
    }

    pub fn total_position(&self) -> u64 { self.total.position() }

    pub fn segment_position(&self, id: u32) -> Option<u64> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.segments.get(index).map(ProgressBar::position)
    }
}

impl ProgressSink for SegmentTracker {
    fn report(&self, event: &ProgressEvent) {
        if let Some(pb) = event
            .segment_id
            .checked_sub(1)
            .and_then(|i| self.segments.get(i as usize))
        {
            pb.set_position(event.segment_bytes_downloaded);
        }

        // workers race, keep the total bar from moving backwards
        let previous = self.high.fetch_max(event.total_bytes_downloaded, Ordering::AcqRel);
        self.total.set_position(previous.max(event.total_bytes_downloaded));
    }
}
