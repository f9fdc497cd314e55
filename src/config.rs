//! Configuration for the collection scanner and exporter

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::VolumeType;
use crate::tree::DEFAULT_COLLECTION_NAME;

/// Placeholder "last change" date written when no real date is captured
pub const PLACEHOLDER_CHANGE_DATE: i64 = 45641;

/// Placeholder volume serial number
pub const PLACEHOLDER_SERIAL_NUMBER: i64 = -1832560112;

/// Default progress reporting interval in milliseconds
pub const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 500;

/// How the top level of the scanned root maps onto volumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeLayout {
    /// Every directory directly under the root is a volume. Files directly
    /// under the root are reported and skipped.
    #[default]
    TopLevelDirectories,
    /// The root itself is the only volume, its entries are folders and files.
    RootAsVolume,
}

/// Fixed values written into the collection and volume records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStamp {
    /// Last change date, as days since 1899-12-30
    pub change_date: i64,
    /// Serial number of the volume's disk
    pub serial_number: i64,
    /// Volume type written in every volume record
    pub volume_type: VolumeType,
}

impl Default for ExportStamp {
    fn default() -> Self {
        Self {
            change_date: PLACEHOLDER_CHANGE_DATE,
            serial_number: PLACEHOLDER_SERIAL_NUMBER,
            volume_type: VolumeType::Fixed,
        }
    }
}

impl ExportStamp {
    /// Placeholder stamp with the change date set from a calendar date
    pub fn dated(date: NaiveDate) -> Self {
        Self {
            change_date: days_since_epoch(date),
            ..Default::default()
        }
    }

    /// Placeholder stamp dated today (local time)
    pub fn today() -> Self {
        Self::dated(chrono::Local::now().date_naive())
    }
}

/// Number of days since 1899-12-30, the date origin used by the manager
pub fn days_since_epoch(date: NaiveDate) -> i64 {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .map(|epoch| date.signed_duration_since(epoch).num_days())
        .unwrap_or_default()
}

/// Configuration for a scan and export run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Root directory to scan
    pub root: PathBuf,

    /// Export file to create; it must not exist yet
    pub output: Option<PathBuf>,

    /// Mapping of the root's top level onto volumes
    pub layout: VolumeLayout,

    /// Name of the collection root node
    pub collection_name: String,

    /// Values written in the collection and volume records
    pub stamp: ExportStamp,

    /// Whether to emit JSON progress messages on stderr
    pub show_progress: bool,

    /// Minimum interval between progress messages
    pub progress_interval_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            output: None,
            layout: VolumeLayout::default(),
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            stamp: ExportStamp::default(),
            show_progress: false,
            progress_interval_ms: DEFAULT_PROGRESS_INTERVAL_MS,
        }
    }
}

impl ScanConfig {
    /// Create a new config for the given root directory
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ..Default::default()
        }
    }

    /// Create a config builder
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::new()
    }
}

/// Builder for ScanConfig
#[derive(Debug, Default)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the root directory
    pub fn root(mut self, root: PathBuf) -> Self {
        self.config.root = root;
        self
    }

    /// Set the export file path
    pub fn output(mut self, output: PathBuf) -> Self {
        self.config.output = Some(output);
        self
    }

    /// Set the volume layout
    pub fn layout(mut self, layout: VolumeLayout) -> Self {
        self.config.layout = layout;
        self
    }

    /// Treat the root itself as the single volume
    pub fn root_as_volume(mut self) -> Self {
        self.config.layout = VolumeLayout::RootAsVolume;
        self
    }

    /// Set the collection name
    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.config.collection_name = name.into();
        self
    }

    /// Set the export stamp
    pub fn stamp(mut self, stamp: ExportStamp) -> Self {
        self.config.stamp = stamp;
        self
    }

    /// Enable or disable progress messages
    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.config.show_progress = enabled;
        self
    }

    /// Set the progress interval
    pub fn progress_interval_ms(mut self, interval: u64) -> Self {
        self.config.progress_interval_ms = interval;
        self
    }

    /// Build the config
    pub fn build(self) -> ScanConfig {
        self.config
    }
}
