use crate::record::Mode;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

// ── Events from pipeline to console ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractEvent {
    Authenticated { username: String },

    FetchStarted { community: String, mode: Mode },
    FetchProgress { fetched: usize },
    FetchComplete { fetched: usize, partial: bool },

    /// `total` is the number of records that will be written.
    WriteStarted { total: usize },
    RecordWritten { written: usize },

    Finished { written: usize, path: PathBuf },
}

// ── EventSink trait ─────────────────────────────────────────────────────────

/// Abstraction for reporting pipeline progress.
pub trait EventSink: Send + Sync {
    fn send(&self, event: ExtractEvent);
}

/// Drops every event. Used with `--no-progress`.
pub struct SilentSink;

impl EventSink for SilentSink {
    fn send(&self, _event: ExtractEvent) {}
}

// ── Console sink ────────────────────────────────────────────────────────────

pub struct ConsoleSink {
    pb: Mutex<Option<ProgressBar>>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self { pb: Mutex::new(None) }
    }

    fn slot(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.pb.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn make_spinner(message: String) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }

    fn make_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::with_template("  {spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} records")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for ConsoleSink {
    fn send(&self, event: ExtractEvent) {
        match event {
            ExtractEvent::Authenticated { .. } => {}

            ExtractEvent::FetchStarted { community, mode } => {
                let pb = Self::make_spinner(format!("r/{}: fetching {}s", community, mode));
                *self.slot() = Some(pb);
            }
            ExtractEvent::FetchProgress { fetched } => {
                if let Some(pb) = self.slot().as_ref() {
                    pb.set_message(format!("fetched {} items", fetched));
                }
            }
            ExtractEvent::FetchComplete { .. } => {
                if let Some(pb) = self.slot().take() {
                    pb.finish_and_clear();
                }
            }

            ExtractEvent::WriteStarted { total } => {
                *self.slot() = Some(Self::make_bar(total as u64));
            }
            ExtractEvent::RecordWritten { written } => {
                if let Some(pb) = self.slot().as_ref() {
                    pb.set_position(written as u64);
                }
            }

            ExtractEvent::Finished { .. } => {
                if let Some(pb) = self.slot().take() {
                    pb.finish_and_clear();
                }
            }
        }
    }
}
