//! Audio collection scanner and MAC collection exporter
//!
//! This library walks a directory of mp3 and flac files, builds a
//! collection → volume → folder → file tree with aggregate statistics, and
//! writes it as a `.col` export file for the MAC audio collection manager.

pub mod config;
pub mod error;
pub mod extractor;
pub mod models;
pub mod progress;
pub mod scanner;
pub mod tree;
pub mod writer;

pub use config::{ExportStamp, ScanConfig, VolumeLayout};
pub use error::{ScanError, ScanErrorKind};
pub use extractor::{SymphoniaExtractor, TagExtractor};
pub use models::{AudioFormat, AudioTags, CollectionSummary, VolumeType};
pub use progress::{NoopObserver, ProgressReporter, ScanObserver, ScanPhase};
pub use scanner::{build_collection, build_collection_with};
pub use tree::{CollectionTree, Node, NodeId, NodeKind};
pub use writer::{write_collection, write_collection_to, write_collection_with};

use std::path::PathBuf;

/// Build the collection described by `config` and write it to `config.output`
///
/// The whole tree is built before the export file is created, so a build
/// failure never leaves a file behind.
pub fn export_collection<E: TagExtractor>(
    config: &ScanConfig,
    extractor: &E,
) -> Result<CollectionSummary, ScanError> {
    let reporter = ProgressReporter::from_config(config);
    reporter.report_start(config);

    let result = run_export(config, extractor, &reporter);
    match &result {
        Ok(summary) => reporter.report_done(summary),
        Err(e) => reporter.report_error(e),
    }
    result
}

fn run_export<E: TagExtractor>(
    config: &ScanConfig,
    extractor: &E,
    reporter: &ProgressReporter,
) -> Result<CollectionSummary, ScanError> {
    let output: &PathBuf = config
        .output
        .as_ref()
        .ok_or_else(|| ScanError::io_error(None, "No output path configured"))?;

    if output.exists() {
        return Err(ScanError::io_error(
            Some(output.clone()),
            format!("Output file already exists: {:?}", output),
        ));
    }

    reporter.set_phase(ScanPhase::Build);
    let tree = build_collection_with(config, extractor, reporter)?;

    reporter.set_phase(ScanPhase::Write);
    write_collection_with(&tree, output, &config.stamp, reporter)?;

    let summary = tree.summary();
    log::info!(
        "Exported {} files in {} volumes to {:?}",
        summary.files,
        summary.volumes,
        output
    );
    Ok(summary)
}
