//! Progress aggregation.
//!
//! Converts the stream of page-local engine events into one monotonic
//! 0-100 overall percentage plus a status line. Each page of an N-page
//! document owns a budget of `100/N` percentage points; recognition
//! fractions fill the current page's slice on top of the base progress
//! accumulated by the pages before it. A single image is the N=1 case.
//!
//! Invariant: the emitted `overall_percent` sequence is non-decreasing for
//! the lifetime of one operation and always within 0..=100. Out-of-order
//! events that would compute a lower value emit the previous maximum
//! instead.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::ocr::types::{EngineEvent, EngineEventSink};
use crate::types::ProgressUpdate;

/// Consumer of progress updates.
///
/// Implementations must be cheap and non-blocking; the aggregator calls
/// them while holding its internal lock.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, update: ProgressUpdate);
}

/// Sink that forwards updates over an unbounded channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressUpdate>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, update: ProgressUpdate) {
        // A dropped receiver just means nobody is watching anymore.
        self.tx.send(update).ok();
    }
}

/// Sink that discards every update.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _update: ProgressUpdate) {}
}

struct AggregatorState {
    /// 1-based page currently being processed; 0 before the first page.
    current_page: u32,
    last_percent: u8,
    /// Whether recognition progress has been reported for the current page.
    page_saw_recognition: bool,
}

/// Aggregates engine events into overall progress for one operation.
pub struct ProgressAggregator {
    sink: Arc<dyn ProgressSink>,
    total_pages: u32,
    /// Fraction of each page's budget granted when the page finishes
    /// rendering, before recognition events arrive. A tuning knob, not an
    /// invariant; see `PipelineConfig::render_reserve`.
    render_reserve: f64,
    state: Mutex<AggregatorState>,
}

impl ProgressAggregator {
    /// Aggregator for a document with `total_pages` pages (must be >= 1;
    /// zero-page documents are rejected before aggregation starts).
    pub fn new(sink: Arc<dyn ProgressSink>, total_pages: u32, render_reserve: f64) -> Self {
        debug_assert!(total_pages >= 1, "zero-page documents must be rejected upstream");
        Self {
            sink,
            total_pages: total_pages.max(1),
            render_reserve: render_reserve.clamp(0.0, 1.0),
            state: Mutex::new(AggregatorState {
                current_page: 0,
                last_percent: 0,
                page_saw_recognition: false,
            }),
        }
    }

    /// Aggregator for single-image input: one page holding the whole
    /// 0-100 range, no render step.
    pub fn for_image(sink: Arc<dyn ProgressSink>) -> Self {
        Self::new(sink, 1, 0.0)
    }

    /// Percentage points allotted to each page.
    pub fn page_budget(&self) -> f64 {
        100.0 / f64::from(self.total_pages)
    }

    /// Progress already completed when page `page` (1-based) starts.
    pub fn base_progress(&self, page: u32) -> f64 {
        f64::from(page.saturating_sub(1)) / f64::from(self.total_pages) * 100.0
    }

    /// Last emitted overall percentage.
    pub fn percent(&self) -> u8 {
        self.state.lock().last_percent
    }

    /// Mark the start of page `page` (1-based).
    pub fn begin_page(&self, page: u32) {
        let mut state = self.state.lock();
        state.current_page = page;
        state.page_saw_recognition = false;
        let message = if self.total_pages == 1 {
            "Processing document".to_string()
        } else {
            format!("Processing page {} of {}", page, self.total_pages)
        };
        self.emit(&mut state, self.base_progress(page), message);
    }

    /// Grant the render reserve for the current page: rendering is done,
    /// recognition is about to start.
    pub fn page_rendered(&self) {
        let mut state = self.state.lock();
        if state.current_page == 0 {
            return;
        }
        let value = self.base_progress(state.current_page) + self.render_reserve * self.page_budget();
        let message = format!("Rendered page {} of {}", state.current_page, self.total_pages);
        self.emit(&mut state, value, message);
    }

    /// Fold one engine event into the overall progress.
    pub fn handle_event(&self, event: EngineEvent) {
        match event {
            EngineEvent::Recognizing { fraction } => {
                let fraction = f64::from(fraction.clamp(0.0, 1.0));
                let mut state = self.state.lock();
                let page = state.current_page.max(1);
                state.page_saw_recognition = true;
                let value = self.base_progress(page) + fraction * self.page_budget();
                let message = if self.total_pages == 1 {
                    "Recognizing text".to_string()
                } else {
                    format!("Recognizing text (page {} of {})", page, self.total_pages)
                };
                self.emit(&mut state, value, message);
            }
            EngineEvent::Status(message) => {
                let mut state = self.state.lock();
                // Lifecycle statuses are surfaced verbatim, but once
                // recognition progress has been reported for the current
                // page they are stale noise and must not overwrite the
                // recognizing message.
                if state.page_saw_recognition {
                    return;
                }
                let held = f64::from(state.last_percent);
                self.emit(&mut state, held, message);
            }
        }
    }

    /// Emit the terminal 100% update.
    pub fn complete(&self) {
        let mut state = self.state.lock();
        self.emit(&mut state, 100.0, "Recognition complete".to_string());
    }

    fn emit(&self, state: &mut AggregatorState, value: f64, message: String) {
        let computed = value.round().clamp(0.0, 100.0) as u8;
        let percent = computed.max(state.last_percent);
        state.last_percent = percent;
        self.sink.emit(ProgressUpdate {
            overall_percent: percent,
            message,
        });
    }
}

impl EngineEventSink for ProgressAggregator {
    fn emit(&self, event: EngineEvent) {
        self.handle_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CollectingSink {
        updates: Mutex<Vec<ProgressUpdate>>,
    }

    impl ProgressSink for CollectingSink {
        fn emit(&self, update: ProgressUpdate) {
            self.updates.lock().push(update);
        }
    }

    impl CollectingSink {
        fn percents(&self) -> Vec<u8> {
            self.updates.lock().iter().map(|u| u.overall_percent).collect()
        }

        fn last(&self) -> ProgressUpdate {
            self.updates.lock().last().cloned().expect("no updates emitted")
        }
    }

    fn aggregator(total_pages: u32) -> (Arc<CollectingSink>, ProgressAggregator) {
        let sink = Arc::new(CollectingSink::default());
        let agg = ProgressAggregator::new(sink.clone(), total_pages, 0.0);
        (sink, agg)
    }

    #[test]
    fn test_single_page_pdf_fraction_maps_directly() {
        let (sink, agg) = aggregator(1);
        agg.begin_page(1);
        agg.handle_event(EngineEvent::Recognizing { fraction: 0.4 });
        assert_eq!(sink.last().overall_percent, 40);
    }

    #[test]
    fn test_three_page_pdf_page_two_half_done() {
        let (sink, agg) = aggregator(3);
        agg.begin_page(1);
        agg.handle_event(EngineEvent::Recognizing { fraction: 1.0 });
        agg.begin_page(2);
        assert_eq!(sink.last().overall_percent, 33);
        agg.handle_event(EngineEvent::Recognizing { fraction: 0.5 });
        assert_eq!(sink.last().overall_percent, 50);
    }

    #[test]
    fn test_budget_partition_base_progress() {
        let (sink, agg) = aggregator(4);
        for page in 1..=4u32 {
            agg.begin_page(page);
            let expected = ((f64::from(page - 1) / 4.0) * 100.0).round() as u8;
            assert_eq!(sink.last().overall_percent, expected);
            agg.handle_event(EngineEvent::Recognizing { fraction: 1.0 });
        }
    }

    #[test]
    fn test_image_progress_is_fraction_times_hundred() {
        let sink = Arc::new(CollectingSink::default());
        let agg = ProgressAggregator::for_image(sink.clone());
        agg.begin_page(1);
        agg.handle_event(EngineEvent::Recognizing { fraction: 0.25 });
        assert_eq!(sink.last().overall_percent, 25);
        assert_eq!(sink.last().message, "Recognizing text");
    }

    #[test]
    fn test_monotonic_under_out_of_order_fractions() {
        let (sink, agg) = aggregator(2);
        agg.begin_page(1);
        for fraction in [0.2, 0.8, 0.3, 0.9, 0.1, 1.0] {
            agg.handle_event(EngineEvent::Recognizing { fraction });
        }
        let percents = sink.percents();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]), "sequence decreased: {percents:?}");
        assert_eq!(sink.last().overall_percent, 50);
    }

    #[test]
    fn test_out_of_order_fraction_clamps_to_previous_maximum() {
        let (sink, agg) = aggregator(1);
        agg.begin_page(1);
        agg.handle_event(EngineEvent::Recognizing { fraction: 0.8 });
        agg.handle_event(EngineEvent::Recognizing { fraction: 0.3 });
        assert_eq!(sink.last().overall_percent, 80);
    }

    #[test]
    fn test_status_surfaced_verbatim_before_recognition() {
        let (sink, agg) = aggregator(2);
        agg.begin_page(1);
        agg.handle_event(EngineEvent::Status("loading model".to_string()));
        let last = sink.last();
        assert_eq!(last.message, "loading model");
        assert_eq!(last.overall_percent, 0);
    }

    #[test]
    fn test_stale_status_does_not_overwrite_recognizing_message() {
        let (sink, agg) = aggregator(2);
        agg.begin_page(1);
        agg.handle_event(EngineEvent::Recognizing { fraction: 0.6 });
        agg.handle_event(EngineEvent::Status("loading model".to_string()));
        let last = sink.last();
        assert_eq!(last.message, "Recognizing text (page 1 of 2)");
        assert_eq!(last.overall_percent, 30);
    }

    #[test]
    fn test_status_allowed_again_after_next_page_begins() {
        let (sink, agg) = aggregator(2);
        agg.begin_page(1);
        agg.handle_event(EngineEvent::Recognizing { fraction: 1.0 });
        agg.begin_page(2);
        agg.handle_event(EngineEvent::Status("loading model".to_string()));
        assert_eq!(sink.last().message, "loading model");
        assert_eq!(sink.last().overall_percent, 50);
    }

    #[test]
    fn test_render_reserve_grants_fraction_of_page_budget() {
        let sink = Arc::new(CollectingSink::default());
        let agg = ProgressAggregator::new(sink.clone(), 2, 0.1);
        agg.begin_page(1);
        agg.page_rendered();
        // 10% of a 50-point budget
        assert_eq!(sink.last().overall_percent, 5);
    }

    #[test]
    fn test_recognition_fraction_clamped_to_unit_range() {
        let (sink, agg) = aggregator(1);
        agg.begin_page(1);
        agg.handle_event(EngineEvent::Recognizing { fraction: 3.5 });
        assert_eq!(sink.last().overall_percent, 100);
        agg.handle_event(EngineEvent::Recognizing { fraction: -1.0 });
        assert_eq!(sink.last().overall_percent, 100);
    }

    #[test]
    fn test_complete_emits_hundred() {
        let (sink, agg) = aggregator(3);
        agg.begin_page(3);
        agg.handle_event(EngineEvent::Recognizing { fraction: 0.9 });
        agg.complete();
        assert_eq!(sink.last().overall_percent, 100);
        assert_eq!(sink.last().message, "Recognition complete");
    }

    #[test]
    fn test_page_budget_and_base_progress_math() {
        let (_, agg) = aggregator(3);
        assert!((agg.page_budget() - 33.333).abs() < 0.01);
        assert_eq!(agg.base_progress(1), 0.0);
        assert!((agg.base_progress(2) - 33.333).abs() < 0.01);
        assert!((agg.base_progress(3) - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_channel_sink_forwards_updates() {
        let (sink, mut rx) = ChannelSink::new();
        sink.emit(ProgressUpdate::new(10, "working"));
        let update = rx.try_recv().unwrap();
        assert_eq!(update.overall_percent, 10);
        assert_eq!(update.message, "working");
    }

    #[test]
    fn test_null_sink_discards() {
        NullSink.emit(ProgressUpdate::new(50, "ignored"));
    }
}
