//! Live progress on the terminal.
//!
//! A spinner follows the mirror events of a run. While it is drawn, log
//! output is routed through [`SpinnerLogger`] so lines are printed above the
//! spinner instead of through it.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::logging::{LogEntry, LogLevel, LoggerSink};
use core_async::sync::broadcast::error::RecvError;
use core_runtime::events::{EventStream, MirrorEvent};
use indicatif::{ProgressBar, ProgressStyle};

/// Spinner fed by mirror events.
#[derive(Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim} [{elapsed_precise}]")
        {
            bar.set_style(style);
        }
        bar.set_prefix("Starting");
        Self { bar }
    }

    /// Begin animating the spinner.
    pub fn start(&self) {
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    /// Reporter that draws nothing.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    /// Update the spinner for one event.
    pub fn apply(&self, event: &MirrorEvent) {
        match event {
            MirrorEvent::Started { root_name, .. } => {
                self.bar.set_prefix("Mirroring");
                self.bar.set_message(format!("Walking through `{root_name}`"));
            }
            MirrorEvent::FolderEntered {
                depth, local_path, ..
            } => {
                self.bar.set_prefix(format!("Depth {depth}"));
                self.bar.set_message(local_path.clone());
            }
            MirrorEvent::PointerWritten { .. } => self.bar.inc(1),
            MirrorEvent::Retrying {
                operation,
                attempt,
                max_attempts,
                delay_ms,
                ..
            } => {
                self.bar.set_message(format!(
                    "{operation} failed (attempt {attempt}/{max_attempts}), retrying in {delay_ms}ms"
                ));
            }
            MirrorEvent::Completed { pointers, .. } => {
                self.bar.set_prefix("Done");
                self.bar.set_message(format!("{pointers} pointer files"));
            }
            MirrorEvent::Failed { message, .. } => {
                self.bar.set_prefix("Failed");
                self.bar.set_message(message.clone());
            }
            MirrorEvent::FolderExited { .. } | MirrorEvent::FolderSkipped { .. } => {}
        }
    }

    /// Follow `stream` until the run ends or the bus closes.
    pub async fn follow(&self, mut stream: EventStream) {
        loop {
            match stream.recv().await {
                Ok(event) => {
                    self.apply(&event);
                    if event.is_terminal() {
                        break;
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    }

    /// Drive `run` while following `stream` in the background.
    ///
    /// A failed run may never publish a terminal event, so the follower is
    /// aborted instead of awaited when `run` returns an error.
    pub async fn track<T, E, F>(&self, stream: EventStream, run: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        let reporter = self.clone();
        let follower = core_async::spawn(async move { reporter.follow(stream).await });

        let result = run.await;
        if result.is_ok() {
            follower.await.ok();
        } else {
            follower.abort();
        }
        result
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints log entries above the spinner.
pub struct SpinnerLogger {
    bar: ProgressBar,
    min_level: LogLevel,
}

impl SpinnerLogger {
    pub fn new(bar: ProgressBar, min_level: LogLevel) -> Self {
        Self { bar, min_level }
    }
}

/// One-line rendering of a log entry: `LEVEL message key=value ...`.
pub fn format_entry(entry: &LogEntry) -> String {
    let level = match entry.level {
        LogLevel::Trace => "TRACE",
        LogLevel::Debug => "DEBUG",
        LogLevel::Info => "INFO",
        LogLevel::Warn => "WARN",
        LogLevel::Error => "ERROR",
    };

    let mut fields: Vec<_> = entry.fields.iter().collect();
    fields.sort();

    let mut line = format!("{level:>5} {}", entry.message);
    for (key, value) in fields {
        line.push_str(&format!(" {key}={value}"));
    }
    line
}

#[async_trait]
impl LoggerSink for SpinnerLogger {
    async fn log(&self, entry: LogEntry) -> BridgeResult<()> {
        if entry.level >= self.min_level {
            self.bar.println(format_entry(&entry));
        }
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        self.min_level
    }
}
