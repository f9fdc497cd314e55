//! Scanner module - builds the collection tree from a directory

use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::{ScanConfig, VolumeLayout};
use crate::error::ScanError;
use crate::extractor::TagExtractor;
use crate::models::AudioFormat;
use crate::progress::{NoopObserver, ScanObserver};
use crate::tree::{CollectionTree, NodeId, NodeKind, DEFAULT_COLLECTION_NAME};

/// Build the collection for `root` with the default layout
///
/// Every directory directly under `root` becomes a volume.
pub fn build_collection<E: TagExtractor>(
    root: &Path,
    extractor: &E,
) -> Result<CollectionTree, ScanError> {
    build_tree(
        root,
        VolumeLayout::TopLevelDirectories,
        DEFAULT_COLLECTION_NAME,
        extractor,
        &NoopObserver,
    )
}

/// Build the collection described by `config`, notifying `observer`
pub fn build_collection_with<E: TagExtractor>(
    config: &ScanConfig,
    extractor: &E,
    observer: &dyn ScanObserver,
) -> Result<CollectionTree, ScanError> {
    build_tree(
        &config.root,
        config.layout,
        &config.collection_name,
        extractor,
        observer,
    )
}

/// Internal build implementation
///
/// The walk is a single pre-order pass. `parents[d - 1]` holds the node that
/// receives entries found at walk depth `d`; it is truncated as the walk
/// climbs back up.
fn build_tree<E: TagExtractor>(
    root: &Path,
    layout: VolumeLayout,
    collection_name: &str,
    extractor: &E,
    observer: &dyn ScanObserver,
) -> Result<CollectionTree, ScanError> {
    check_root(root)?;
    log::info!("Building collection {:?} from {:?} ({:?})", collection_name, root, layout);

    let mut tree = CollectionTree::new(collection_name);
    let top = match layout {
        VolumeLayout::TopLevelDirectories => tree.root(),
        VolumeLayout::RootAsVolume => {
            let name = last_segment(root);
            observer.volume_started(&name);
            tree.add_volume(name)?
        }
    };
    let mut parents: Vec<NodeId> = vec![top];

    let walker = WalkDir::new(root).min_depth(1).follow_links(true);

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            log::error!("Unexpected item in {:?}: {}", path, e);
            ScanError::unexpected_entry(path)
        })?;

        let depth = entry.depth();
        parents.truncate(depth);
        let parent = parents.get(depth - 1).copied().ok_or_else(|| {
            ScanError::structural(
                &entry.file_name().to_string_lossy(),
                "Entry found below a skipped directory",
            )
        })?;
        let at_collection = matches!(tree.node(parent).kind(), NodeKind::Collection);

        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            let id = if at_collection {
                log::debug!("Adding volume {:?}", name);
                observer.volume_started(&name);
                tree.add_volume(name)?
            } else {
                log::debug!("Adding folder {:?}", path);
                observer.folder_entered(path);
                tree.add_folder(parent, name)?
            };
            parents.push(id);
        } else if file_type.is_file() {
            let format = AudioFormat::from_file_name(&name);
            if !format.is_recognized() {
                continue;
            }
            if at_collection {
                log::warn!("Skipping audio file outside of any volume: {:?}", path);
                continue;
            }

            log::debug!("Adding {} file {:?}", format, path);
            let tags = extractor.extract(path).map_err(|mut e| {
                if e.path.is_none() {
                    e.path = Some(path.to_path_buf());
                }
                log::error!("Tag extraction failed: {}", e);
                e
            })?;
            tree.add_file(parent, name, tags)?;
            observer.file_added(path);
        } else {
            log::error!("Unexpected item in {:?}", path);
            return Err(ScanError::unexpected_entry(path.to_path_buf()));
        }
    }

    log::info!(
        "Collection {:?} built: {} nodes, {} files",
        collection_name,
        tree.len(),
        tree.file_count(tree.root())
    );
    Ok(tree)
}

/// Fail unless `root` is an existing directory
fn check_root(root: &Path) -> Result<(), ScanError> {
    let metadata = fs::metadata(root)
        .map_err(|e| ScanError::invalid_root(root.to_path_buf(), e.to_string()))?;
    if !metadata.is_dir() {
        return Err(ScanError::invalid_root(
            root.to_path_buf(),
            format!("Not a directory: {:?}", root),
        ));
    }
    Ok(())
}

/// Last path segment, e.g. "dir_c" for "G:/dir_a/dir_b/dir_c"
fn last_segment(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .or_else(|| {
            path.canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
