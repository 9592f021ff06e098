//! Terminal spinner driven by progress events
//!
//! Log lines and the spinner share stderr. [`BarWriter`] clears the spinner
//! line around every write so `tracing` output never lands mid-frame.

use crate::progress::{LoggingHandler, ProgressEvent, ProgressHandler};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

/// Spinner with the run's style, already ticking.
pub fn spinner_bar() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} [{elapsed}] {msg}") {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Writer that hides `bar` while a log line is written to `inner`.
pub struct BarWriter<W> {
    bar: ProgressBar,
    inner: W,
}

impl<W: Write> BarWriter<W> {
    pub fn new(bar: ProgressBar, inner: W) -> Self {
        Self { bar, inner }
    }
}

impl<W: Write> Write for BarWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let inner = &mut self.inner;
        self.bar.suspend(|| inner.write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let inner = &mut self.inner;
        self.bar.suspend(|| inner.write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// `MakeWriter` for the subscriber: stderr, routed around the spinner.
#[derive(Clone)]
pub struct SpinnerLogWriter {
    bar: ProgressBar,
}

impl SpinnerLogWriter {
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl<'a> MakeWriter<'a> for SpinnerLogWriter {
    type Writer = BarWriter<io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        BarWriter::new(self.bar.clone(), io::stderr())
    }
}

/// Shows the entry being processed and running counts, and forwards every
/// event to a [`LoggingHandler`].
///
/// Install [`SpinnerLogWriter`] over the same bar so those log lines, and
/// every other `tracing` event, are printed around the spinner.
pub struct SpinnerHandler {
    bar: ProgressBar,
    logger: LoggingHandler,
    done: AtomicUsize,
    rows: AtomicUsize,
}

impl SpinnerHandler {
    pub fn new() -> Self {
        Self::with_bar(spinner_bar())
    }

    /// Drives an existing bar, typically the one the log writer suspends.
    /// The handler never suspends the bar itself; suspends do not nest.
    pub fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            logger: LoggingHandler,
            done: AtomicUsize::new(0),
            rows: AtomicUsize::new(0),
        }
    }

    fn counts(&self) -> String {
        format!(
            "{} done, {} rows",
            self.done.load(Ordering::Relaxed),
            self.rows.load(Ordering::Relaxed)
        )
    }
}

impl Default for SpinnerHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressHandler for SpinnerHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        self.logger.on_progress(event);

        match event {
            ProgressEvent::RunStarted { source, .. } => {
                self.bar.set_message(format!("Reading {}", source));
            }
            ProgressEvent::PageFetched { page_index, .. } => {
                self.bar
                    .set_message(format!("Page {} | {}", page_index + 1, self.counts()));
            }
            ProgressEvent::EntryStarted { entry } => {
                self.bar.set_message(format!("{} | {}", entry, self.counts()));
            }
            ProgressEvent::EntryExtracted { .. } => {
                self.done.fetch_add(1, Ordering::Relaxed);
                self.rows.fetch_add(1, Ordering::Relaxed);
            }
            ProgressEvent::EntryTimedOut { .. }
            | ProgressEvent::EntryFailed { .. }
            | ProgressEvent::RowSkipped { .. } => {
                self.done.fetch_add(1, Ordering::Relaxed);
            }
            ProgressEvent::RunCompleted { .. } => {
                self.bar.finish_and_clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_log_lines_pass_through_bar() {
        let bar = ProgressBar::hidden();
        bar.set_message("acme/server");
        let buffer = Buffer::default();

        let mut writer = BarWriter::new(bar.clone(), buffer.clone());
        writer.write_all(b"WARN Extraction timed out\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(&*buffer.0.lock().unwrap(), b"WARN Extraction timed out\n");
        assert_eq!(bar.message(), "acme/server");
        assert!(!bar.is_finished());
    }

    #[test]
    fn test_tracing_output_goes_through_bar_writer() {
        let bar = ProgressBar::hidden();
        let buffer = Buffer::default();
        let sink = buffer.clone();
        let writer_bar = bar.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || BarWriter::new(writer_bar.clone(), sink.clone()))
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(entry = "acme/server-2", "Extraction timed out");
        });

        let text = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("Extraction timed out"));
        assert!(text.contains("acme/server-2"));
    }

    #[test]
    fn test_handler_logs_through_shared_bar() {
        let bar = ProgressBar::hidden();
        let buffer = Buffer::default();
        let sink = buffer.clone();
        let writer_bar = bar.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || BarWriter::new(writer_bar.clone(), sink.clone()))
            .finish();
        let handler = SpinnerHandler::with_bar(bar.clone());

        tracing::subscriber::with_default(subscriber, || {
            handler.on_progress(&ProgressEvent::RunStarted {
                source: "catalog".into(),
                page_size: 12,
                output: "census.csv".into(),
            });
        });

        assert_eq!(bar.message(), "Reading catalog");
        let text = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
        assert!(text.contains("Starting harvest"));
    }
}
