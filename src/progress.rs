//! Progress reporting for build and export runs
//!
//! The builder and the writer notify a [`ScanObserver`]; nothing they compute
//! depends on it. [`ProgressReporter`] turns the notifications into JSON lines
//! on stderr for external callers.

use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use crate::config::{ScanConfig, VolumeLayout};
use crate::error::ScanError;
use crate::models::CollectionSummary;

/// Receives build and export events
pub trait ScanObserver {
    /// A volume node was created
    fn volume_started(&self, _name: &str) {}
    /// A folder node was created for `path`
    fn folder_entered(&self, _path: &Path) {}
    /// A file node was created for `path`
    fn file_added(&self, _path: &Path) {}
    /// One export record was written
    fn record_written(&self) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

/// Phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScanPhase {
    /// Walking the filesystem and building the tree
    #[default]
    Build,
    /// Writing the export file
    Write,
    /// Run completed
    Done,
}

impl ScanPhase {
    /// Get string representation of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanPhase::Build => "build",
            ScanPhase::Write => "write",
            ScanPhase::Done => "done",
        }
    }
}

/// Start message sent when a run begins
#[derive(Debug, Clone, Serialize)]
pub struct StartMessage {
    #[serde(rename = "_t")]
    pub msg_type: &'static str,
    pub seq: u64,
    /// Timestamp in milliseconds since reporter creation
    pub ts: u64,
    pub root: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub layout: VolumeLayout,
}

impl StartMessage {
    pub fn new(seq: u64, ts: u64, config: &ScanConfig) -> Self {
        Self {
            msg_type: "start",
            seq,
            ts,
            root: config.root.to_string_lossy().to_string(),
            output: config
                .output
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
            layout: config.layout,
        }
    }
}

/// Progress message sent during a run
#[derive(Debug, Clone, Serialize)]
pub struct ProgressMessage {
    /// Message type identifier ("p" for progress)
    #[serde(rename = "_t")]
    pub msg_type: &'static str,
    pub seq: u64,
    pub ts: u64,
    pub phase: ScanPhase,
    /// Volumes created so far
    #[serde(rename = "v")]
    pub volumes: u64,
    /// Folders created so far
    #[serde(rename = "d")]
    pub folders: u64,
    /// Files created so far
    #[serde(rename = "f")]
    pub files: u64,
    /// Records written so far
    #[serde(rename = "r")]
    pub records: u64,
    /// Last directory entered
    pub dir: String,
}

/// Error message sent when a run aborts
#[derive(Debug, Clone, Serialize)]
pub struct ErrorProgressMessage {
    /// Message type identifier ("err" for error)
    #[serde(rename = "_t")]
    pub msg_type: &'static str,
    pub seq: u64,
    pub ts: u64,
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorProgressMessage {
    pub fn new(seq: u64, ts: u64, error: &ScanError) -> Self {
        Self {
            msg_type: "err",
            seq,
            ts,
            error_type: error.kind.as_str().to_string(),
            message: error.message.clone(),
            path: error.path.as_ref().map(|p| p.to_string_lossy().to_string()),
        }
    }
}

/// Done message sent when a run completes
#[derive(Debug, Clone, Serialize)]
pub struct DoneMessage {
    /// Message type identifier ("done" for completion)
    #[serde(rename = "_t")]
    pub msg_type: &'static str,
    pub seq: u64,
    pub ts: u64,
    /// Volume count
    #[serde(rename = "tv")]
    pub volumes: usize,
    /// Folder count, as written in the collection record
    #[serde(rename = "td")]
    pub folders: u64,
    /// File count
    #[serde(rename = "tf")]
    pub files: u64,
    /// Size in kilobytes
    pub kb: u64,
    /// Duration in whole seconds
    pub secs: u64,
    /// Records written
    #[serde(rename = "r")]
    pub records: u64,
    /// Total run duration in milliseconds
    pub ms: u64,
}

/// Progress reporter writing JSON lines to stderr
///
/// Counters are updated on every event; progress lines are throttled to one
/// per interval. Start, error and done lines are always written. The reporter
/// lives on the thread running the build, so all state is held in cells.
pub struct ProgressReporter {
    enabled: bool,
    interval_ms: u64,
    last_report: Cell<Instant>,
    seq: Cell<u64>,
    start_time: Instant,
    phase: Cell<ScanPhase>,
    volumes: Cell<u64>,
    folders: Cell<u64>,
    files: Cell<u64>,
    records: Cell<u64>,
    current_dir: RefCell<String>,
}

impl ProgressReporter {
    /// Create a new ProgressReporter
    ///
    /// # Arguments
    /// * `enabled` - Whether progress reporting is enabled
    /// * `interval_ms` - Minimum interval between progress messages in milliseconds
    pub fn new(enabled: bool, interval_ms: u64) -> Self {
        let now = Instant::now();
        Self {
            enabled,
            interval_ms,
            last_report: Cell::new(now),
            seq: Cell::new(0),
            start_time: now,
            phase: Cell::new(ScanPhase::Build),
            volumes: Cell::new(0),
            folders: Cell::new(0),
            files: Cell::new(0),
            records: Cell::new(0),
            current_dir: RefCell::new(String::new()),
        }
    }

    /// Create a reporter following the config's progress settings
    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.show_progress, config.progress_interval_ms)
    }

    /// Check if the reporter is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Check if enough time has passed since the last report
    pub fn should_report(&self) -> bool {
        if !self.enabled {
            return false;
        }
        let elapsed = self.last_report.get().elapsed().as_millis() as u64;
        elapsed >= self.interval_ms
    }

    /// Get the next sequence number (monotonically increasing)
    pub fn next_seq(&self) -> u64 {
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        seq
    }

    /// Get the current timestamp in milliseconds since reporter creation
    pub fn current_timestamp(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Switch the phase reported in progress lines
    pub fn set_phase(&self, phase: ScanPhase) {
        self.phase.set(phase);
    }

    /// Output a serializable message to stderr as JSON
    pub fn output_to_stderr<T: Serialize>(&self, msg: &T) {
        if let Ok(json) = serde_json::to_string(msg) {
            eprintln!("{}", json);
            std::io::stderr().flush().ok();
        }
    }

    /// Report the start of a run
    pub fn report_start(&self, config: &ScanConfig) {
        if !self.enabled {
            return;
        }
        let msg = StartMessage::new(self.next_seq(), self.current_timestamp(), config);
        self.output_to_stderr(&msg);
    }

    /// Build the current progress message
    pub fn progress_message(&self) -> ProgressMessage {
        ProgressMessage {
            msg_type: "p",
            seq: self.next_seq(),
            ts: self.current_timestamp(),
            phase: self.phase.get(),
            volumes: self.volumes.get(),
            folders: self.folders.get(),
            files: self.files.get(),
            records: self.records.get(),
            dir: self.current_dir.borrow().clone(),
        }
    }

    /// Report progress if the interval has elapsed
    ///
    /// Returns true if a message was actually sent.
    pub fn report_progress(&self) -> bool {
        if !self.should_report() {
            return false;
        }
        let msg = self.progress_message();
        self.output_to_stderr(&msg);
        self.last_report.set(Instant::now());
        true
    }

    /// Report the error that aborted the run
    pub fn report_error(&self, error: &ScanError) {
        if !self.enabled {
            return;
        }
        let msg = ErrorProgressMessage::new(self.next_seq(), self.current_timestamp(), error);
        self.output_to_stderr(&msg);
    }

    /// Build the completion message
    pub fn done_message(&self, summary: &CollectionSummary) -> DoneMessage {
        DoneMessage {
            msg_type: "done",
            seq: self.next_seq(),
            ts: self.current_timestamp(),
            volumes: summary.volumes,
            folders: summary.folders,
            files: summary.files,
            kb: summary.size_kb(),
            secs: summary.duration.floor() as u64,
            records: self.records.get(),
            ms: self.current_timestamp(),
        }
    }

    /// Report run completion
    pub fn report_done(&self, summary: &CollectionSummary) {
        if !self.enabled {
            return;
        }
        self.set_phase(ScanPhase::Done);
        let msg = self.done_message(summary);
        self.output_to_stderr(&msg);
    }

    /// Number of file events seen so far
    pub fn files_seen(&self) -> u64 {
        self.files.get()
    }

    /// Number of records written so far
    pub fn records_written(&self) -> u64 {
        self.records.get()
    }
}

impl ScanObserver for ProgressReporter {
    fn volume_started(&self, name: &str) {
        self.volumes.set(self.volumes.get() + 1);
        *self.current_dir.borrow_mut() = name.to_string();
        self.report_progress();
    }

    fn folder_entered(&self, path: &Path) {
        self.folders.set(self.folders.get() + 1);
        *self.current_dir.borrow_mut() = path.to_string_lossy().to_string();
        self.report_progress();
    }

    fn file_added(&self, _path: &Path) {
        self.files.set(self.files.get() + 1);
        self.report_progress();
    }

    fn record_written(&self) {
        self.records.set(self.records.get() + 1);
        self.report_progress();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanErrorKind;
    use std::path::PathBuf;

    #[test]
    fn test_scan_phase_serialization() {
        assert_eq!(serde_json::to_string(&ScanPhase::Build).unwrap(), "\"build\"");
        assert_eq!(serde_json::to_string(&ScanPhase::Write).unwrap(), "\"write\"");
        assert_eq!(serde_json::to_string(&ScanPhase::Done).unwrap(), "\"done\"");
        assert_eq!(ScanPhase::Write.as_str(), "write");
    }

    #[test]
    fn test_start_message_serialization() {
        let config = ScanConfig::builder()
            .root(PathBuf::from("/music"))
            .output(PathBuf::from("/tmp/out.col"))
            .build();
        let msg = StartMessage::new(1, 100, &config);
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["_t"], "start");
        assert_eq!(parsed["seq"], 1);
        assert_eq!(parsed["root"], "/music");
        assert_eq!(parsed["output"], "/tmp/out.col");
        assert_eq!(parsed["layout"], "top_level_directories");
    }

    #[test]
    fn test_observer_counts_events() {
        let reporter = ProgressReporter::new(false, 200);
        reporter.volume_started("V1");
        reporter.folder_entered(Path::new("/music/V1/CD1"));
        reporter.file_added(Path::new("/music/V1/CD1/a.mp3"));
        reporter.file_added(Path::new("/music/V1/CD1/b.mp3"));
        reporter.record_written();

        let msg = reporter.progress_message();
        assert_eq!(msg.volumes, 1);
        assert_eq!(msg.folders, 1);
        assert_eq!(msg.files, 2);
        assert_eq!(msg.records, 1);
        assert_eq!(msg.dir, "/music/V1/CD1");
        assert_eq!(reporter.files_seen(), 2);
    }

    #[test]
    fn test_progress_message_serialization() {
        let reporter = ProgressReporter::new(true, 200);
        reporter.set_phase(ScanPhase::Write);
        let json = serde_json::to_string(&reporter.progress_message()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["_t"], "p");
        assert_eq!(parsed["phase"], "write");
        assert_eq!(parsed["f"], 0);
    }

    #[test]
    fn test_error_message_serialization() {
        let error = ScanError::unexpected_entry(PathBuf::from("/music/V1/link"));
        let msg = ErrorProgressMessage::new(3, 300, &error);
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["_t"], "err");
        assert_eq!(parsed["error_type"], "unexpected_entry");
        assert_eq!(parsed["path"], "/music/V1/link");
    }

    #[test]
    fn test_error_message_without_path() {
        let error = ScanError::new(ScanErrorKind::Structural, None, "bad tree");
        let json = serde_json::to_string(&ErrorProgressMessage::new(1, 1, &error)).unwrap();
        assert!(!json.contains("\"path\""));
    }

    #[test]
    fn test_done_message() {
        let reporter = ProgressReporter::new(true, 200);
        let summary = CollectionSummary {
            name: "AudioCollection".to_string(),
            volumes: 2,
            folders: 3,
            files: 4,
            size: 10 * 1024 + 5,
            duration: 99.9,
        };
        let parsed = serde_json::to_value(reporter.done_message(&summary)).unwrap();
        assert_eq!(parsed["_t"], "done");
        assert_eq!(parsed["tv"], 2);
        assert_eq!(parsed["td"], 3);
        assert_eq!(parsed["tf"], 4);
        assert_eq!(parsed["kb"], 10);
        assert_eq!(parsed["secs"], 99);
    }

    #[test]
    fn test_progress_reporter_sequence_numbers() {
        let reporter = ProgressReporter::new(true, 200);
        assert_eq!(reporter.next_seq(), 0);
        assert_eq!(reporter.next_seq(), 1);
        assert_eq!(reporter.next_seq(), 2);
    }

    #[test]
    fn test_sequence_is_shared_across_message_kinds() {
        let reporter = ProgressReporter::new(true, 60_000);
        reporter.report_start(&ScanConfig::default());
        reporter.file_added(Path::new("/music/V1/a.mp3"));
        reporter.record_written();
        reporter.record_written();

        let msg = reporter.progress_message();
        assert_eq!(msg.seq, 1);
        assert_eq!(msg.files, 1);
        assert_eq!(msg.records, 2);
        assert_eq!(reporter.records_written(), 2);
        assert_eq!(reporter.next_seq(), 2);
    }

    #[test]
    fn test_progress_reporter_should_report_disabled() {
        let reporter = ProgressReporter::new(false, 0);
        assert!(!reporter.should_report());
        assert!(!reporter.report_progress());
    }

    #[test]
    fn test_progress_reporter_should_report_timing() {
        let reporter = ProgressReporter::new(true, 10);
        reporter.last_report.set(Instant::now());
        assert!(!reporter.should_report());

        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(reporter.should_report());
    }

    #[test]
    fn test_report_start_disabled_does_not_consume_sequence() {
        let reporter = ProgressReporter::new(false, 200);
        reporter.report_start(&ScanConfig::default());
        reporter.report_error(&ScanError::io_error(None, "x"));
        assert_eq!(reporter.next_seq(), 0);
    }
}
