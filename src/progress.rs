use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::ProgressSettings;

/// One progress notification. Stage names are stable identifiers callers can
/// switch on; messages are display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub stage: &'static str,
    pub percent: u8,
    pub message: &'static str,
}

/// Caller-supplied progress callback. Invoked synchronously from the
/// pipeline task.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Wraps an optional sink. A panicking callback is caught and logged; the
/// pipeline must never be aborted by its own progress reporting.
#[derive(Clone, Default)]
pub struct ProgressReporter {
    sink: Option<ProgressSink>,
}

impl ProgressReporter {
    pub fn new(sink: Option<ProgressSink>) -> Self {
        Self { sink }
    }

    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn emit(&self, stage: &'static str, percent: u8, message: &'static str) {
        if let Some(sink) = &self.sink {
            let event = ProgressEvent {
                stage,
                percent,
                message,
            };
            if catch_unwind(AssertUnwindSafe(|| sink(event))).is_err() {
                tracing::warn!("Progress callback panicked at {} {}%", stage, percent);
            }
        }
    }
}

/// Deterministic easing for synthetic ticks: linear in elapsed time, capped
/// at the ceiling so the bar never reaches 100 before the call returns.
pub fn synthetic_percent(elapsed_ms: u64, total_ms: u64, ceiling: u8) -> u8 {
    if total_ms == 0 {
        return ceiling;
    }
    let raw = elapsed_ms.saturating_mul(100) / total_ms;
    raw.min(u64::from(ceiling)) as u8
}

/// Background task emitting synthetic progress while a slow remote call is
/// awaited. Aborted on drop, so every exit path of the surrounding pipeline
/// cleans the timer up.
pub struct ProgressTicker {
    handle: JoinHandle<()>,
}

impl ProgressTicker {
    pub fn spawn(
        reporter: ProgressReporter,
        stage: &'static str,
        message: &'static str,
        pacing: &ProgressSettings,
    ) -> Self {
        let tick = Duration::from_millis(pacing.tick_ms.max(1));
        let total_ms = pacing.total_ms;
        let ceiling = pacing.ceiling_percent;
        let handle = tokio::spawn(async move {
            let started = tokio::time::Instant::now();
            let mut interval = tokio::time::interval(tick);
            // The first interval tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let elapsed = started.elapsed().as_millis() as u64;
                reporter.emit(stage, synthetic_percent(elapsed, total_ms, ceiling), message);
            }
        });
        Self { handle }
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
