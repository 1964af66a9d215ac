//! Run-level timing and counter aggregation.
//!
//! Always enabled; the collected numbers are printed as an end-of-run
//! summary when the CLI is invoked with `--verbose`.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetricKind {
    Duration,
    Counter,
}

/// Named metrics tracked by the perf collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Metric {
    AnnotationLoad,
    SpeakerLoad,
    AudioScan,
    CsvWrite,
    AnnotationLines,
    AnnotationSkipped,
    AudioFiles,
    RowsWritten,
}

impl Metric {
    const COUNT: usize = 8;

    const ALL: [Metric; Metric::COUNT] = [
        Metric::AnnotationLoad,
        Metric::SpeakerLoad,
        Metric::AudioScan,
        Metric::CsvWrite,
        Metric::AnnotationLines,
        Metric::AnnotationSkipped,
        Metric::AudioFiles,
        Metric::RowsWritten,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Metric::AnnotationLoad => "annotation.load",
            Metric::SpeakerLoad => "speaker.load",
            Metric::AudioScan => "audio.scan",
            Metric::CsvWrite => "csv.write",
            Metric::AnnotationLines => "annotation.lines",
            Metric::AnnotationSkipped => "annotation.skipped",
            Metric::AudioFiles => "audio.files",
            Metric::RowsWritten => "rows.written",
        }
    }

    fn kind(self) -> MetricKind {
        match self {
            Metric::AnnotationLoad | Metric::SpeakerLoad | Metric::AudioScan | Metric::CsvWrite => {
                MetricKind::Duration
            }
            _ => MetricKind::Counter,
        }
    }
}

struct PerfCollector {
    start: Instant,
    totals_us: [AtomicU64; Metric::COUNT],
    counts: [AtomicU64; Metric::COUNT],
}

impl PerfCollector {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            totals_us: std::array::from_fn(|_| AtomicU64::new(0)),
            counts: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    fn add_duration(&self, metric: Metric, duration: Duration) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.totals_us[metric.index()].fetch_add(micros, Ordering::Relaxed);
        self.counts[metric.index()].fetch_add(1, Ordering::Relaxed);
    }

    fn add_count(&self, metric: Metric, delta: u64) {
        self.counts[metric.index()].fetch_add(delta, Ordering::Relaxed);
    }

    fn snapshot(&self) -> PerfSnapshot {
        PerfSnapshot {
            uptime: self.start.elapsed(),
            totals_us: std::array::from_fn(|idx| self.totals_us[idx].load(Ordering::Relaxed)),
            counts: std::array::from_fn(|idx| self.counts[idx].load(Ordering::Relaxed)),
        }
    }
}

static COLLECTOR: OnceLock<PerfCollector> = OnceLock::new();

fn collector() -> &'static PerfCollector {
    COLLECTOR.get_or_init(PerfCollector::new)
}

/// A RAII timer that records its duration when dropped.
pub struct PerfSpan {
    metric: Metric,
    start: Instant,
}

impl Drop for PerfSpan {
    fn drop(&mut self) {
        collector().add_duration(self.metric, self.start.elapsed());
    }
}

/// Begin a named timing span.
pub fn span(metric: Metric) -> PerfSpan {
    PerfSpan {
        metric,
        start: Instant::now(),
    }
}

/// Record a counter delta for a named metric.
pub fn add_count(metric: Metric, delta: u64) {
    collector().add_count(metric, delta);
}

/// Snapshot of collected performance data.
#[derive(Debug)]
pub struct PerfSnapshot {
    uptime: Duration,
    totals_us: [u64; Metric::COUNT],
    counts: [u64; Metric::COUNT],
}

impl PerfSnapshot {
    /// Recorded count for `metric` (span entries for durations).
    pub fn count(&self, metric: Metric) -> u64 {
        self.counts[metric.index()]
    }

    /// Format a human-readable report.
    pub fn format(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(
            &mut output,
            "Performance summary (uptime: {:.3}s)",
            self.uptime.as_secs_f64()
        );

        let recorded: Vec<Metric> = Metric::ALL
            .into_iter()
            .filter(|m| self.counts[m.index()] > 0 || self.totals_us[m.index()] > 0)
            .collect();
        if recorded.is_empty() {
            let _ = writeln!(&mut output, "No performance data recorded.");
            return output;
        }

        let (durations, counters): (Vec<Metric>, Vec<Metric>) = recorded
            .into_iter()
            .partition(|m| m.kind() == MetricKind::Duration);

        if !durations.is_empty() {
            let _ = writeln!(&mut output, "Durations:");
            for metric in durations {
                let total_us = self.totals_us[metric.index()];
                let _ = writeln!(
                    &mut output,
                    "  {:<24} {:>10.3}s {:>6}",
                    metric.name(),
                    (total_us as f64) / 1_000_000.0,
                    self.counts[metric.index()]
                );
            }
        }

        if !counters.is_empty() {
            let _ = writeln!(&mut output, "Counters:");
            for metric in counters {
                let _ = writeln!(
                    &mut output,
                    "  {:<24} {}",
                    metric.name(),
                    self.counts[metric.index()]
                );
            }
        }

        output
    }
}

/// Take a snapshot of everything collected so far.
pub fn snapshot() -> PerfSnapshot {
    collector().snapshot()
}

/// Format a report of all collected metrics.
pub fn report() -> String {
    snapshot().format()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_recorded_metrics() {
        {
            let _span = span(Metric::CsvWrite);
        }
        add_count(Metric::RowsWritten, 3);

        let snap = snapshot();
        assert!(snap.count(Metric::CsvWrite) >= 1);
        assert!(snap.count(Metric::RowsWritten) >= 3);

        let text = snap.format();
        assert!(text.contains("csv.write"));
        assert!(text.contains("rows.written"));
    }
}
