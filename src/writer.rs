//! Writer for MAC collection (`.col`) export files
//!
//! Each node becomes one line. Fields are closed by ASCII control
//! characters instead of visible separators, so free text fields can hold
//! any printable character. Folder and file lines are indented with one tab
//! per level below the collection; volume lines always carry a single tab.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::ExportStamp;
use crate::error::ScanError;
use crate::progress::{NoopObserver, ScanObserver};
use crate::tree::{CollectionTree, NodeId, NodeKind};

/// Field terminators, named after their ASCII control codes
mod ascii {
    pub const SOH: u8 = 0x01;
    pub const STX: u8 = 0x02;
    pub const ETX: u8 = 0x03;
    pub const EOT: u8 = 0x04;
    pub const ENQ: u8 = 0x05;
    pub const ACK: u8 = 0x06;
    pub const BEL: u8 = 0x07;
    pub const BS: u8 = 0x08;
    pub const TAB: u8 = 0x09;
    pub const NL: u8 = 0x0A;
    pub const NAK: u8 = 0x15;
    pub const SYN: u8 = 0x16;
    pub const ETB: u8 = 0x17;
    pub const CAN: u8 = 0x18;
    pub const EM: u8 = 0x19;
    pub const SUB: u8 = 0x1A;
    pub const ESC: u8 = 0x1B;
    pub const FS: u8 = 0x1C;
}

use ascii::*;

/// Write `tree` to a new file at `path`
///
/// The file must not exist yet. If writing fails after the file was
/// created, the partial file is removed.
pub fn write_collection(
    tree: &CollectionTree,
    path: &Path,
    stamp: &ExportStamp,
) -> Result<(), ScanError> {
    write_collection_with(tree, path, stamp, &NoopObserver)
}

/// Write `tree` to a new file at `path`, notifying `observer` per record
pub fn write_collection_with(
    tree: &CollectionTree,
    path: &Path,
    stamp: &ExportStamp,
    observer: &dyn ScanObserver,
) -> Result<(), ScanError> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| ScanError::io_error(Some(path.to_path_buf()), e.to_string()))?;
    log::info!("Writing collection to {:?}", path);

    let result = {
        let mut out = BufWriter::new(file);
        write_collection_to_with(tree, &mut out, stamp, observer).and_then(|()| {
            out.flush()
                .map_err(|e| ScanError::io_error(Some(path.to_path_buf()), e.to_string()))
        })
    };

    if let Err(e) = result {
        log::error!("Export to {:?} failed: {}", path, e);
        if let Err(remove) = fs::remove_file(path) {
            log::warn!("Could not remove partial export {:?}: {}", path, remove);
        }
        return Err(e);
    }
    Ok(())
}

/// Write `tree` to any byte sink
pub fn write_collection_to<W: Write>(
    tree: &CollectionTree,
    out: &mut W,
    stamp: &ExportStamp,
) -> Result<(), ScanError> {
    write_collection_to_with(tree, out, stamp, &NoopObserver)
}

fn write_collection_to_with<W: Write>(
    tree: &CollectionTree,
    out: &mut W,
    stamp: &ExportStamp,
    observer: &dyn ScanObserver,
) -> Result<(), ScanError> {
    let mut writer = RecordWriter {
        tree,
        out,
        stamp,
        observer,
    };
    writer.write_collection(tree.root())
}

struct RecordWriter<'a, W> {
    tree: &'a CollectionTree,
    out: &'a mut W,
    stamp: &'a ExportStamp,
    observer: &'a dyn ScanObserver,
}

impl<W: Write> RecordWriter<'_, W> {
    fn write_collection(&mut self, id: NodeId) -> Result<(), ScanError> {
        let tree = self.tree;
        let node = tree.node(id);
        if !matches!(node.kind(), NodeKind::Collection) {
            return Err(ScanError::structural(node.name(), "Expected the collection root"));
        }

        let mut line = Vec::new();
        line.push(SOH);
        self.push_totals(&mut line, id);
        line.extend_from_slice(self.stamp.change_date.to_string().as_bytes());
        line.push(ACK);
        line.push(NL);
        self.emit(&line)?;

        for &child in node.children() {
            match tree.node(child).kind() {
                NodeKind::Volume => self.write_volume(child)?,
                _ => return Err(self.unexpected(child, "collection")),
            }
        }
        Ok(())
    }

    fn write_volume(&mut self, id: NodeId) -> Result<(), ScanError> {
        let tree = self.tree;
        let node = tree.node(id);
        let mut line = vec![TAB];
        line.extend_from_slice(node.name().as_bytes());
        line.push(SOH);
        self.push_totals(&mut line, id);
        line.extend_from_slice(self.stamp.change_date.to_string().as_bytes());
        line.push(ACK);
        line.extend_from_slice(self.stamp.serial_number.to_string().as_bytes());
        line.push(BEL);
        line.extend_from_slice(self.stamp.volume_type.code().to_string().as_bytes());
        line.push(BS);
        line.push(NL);
        self.emit(&line)?;

        self.write_children(id, "volume")
    }

    fn write_folder(&mut self, id: NodeId) -> Result<(), ScanError> {
        let tree = self.tree;
        let node = tree.node(id);
        let mut line = self.indent(id);
        line.extend_from_slice(node.name().as_bytes());
        line.push(SOH);
        self.push_totals(&mut line, id);
        line.push(NL);
        self.emit(&line)?;

        self.write_children(id, "folder")
    }

    fn write_children(&mut self, id: NodeId, parent_kind: &str) -> Result<(), ScanError> {
        let tree = self.tree;
        for &child in tree.node(id).children() {
            match tree.node(child).kind() {
                NodeKind::Folder => self.write_folder(child)?,
                NodeKind::File(_) => self.write_file(child)?,
                _ => return Err(self.unexpected(child, parent_kind)),
            }
        }
        Ok(())
    }

    fn write_file(&mut self, id: NodeId) -> Result<(), ScanError> {
        let tree = self.tree;
        let node = tree.node(id);
        let tags = node
            .tags()
            .ok_or_else(|| ScanError::structural(node.name(), "File node without tags"))?;
        let format = node.format();

        let mut line = self.indent(id);
        line.extend_from_slice(node.name().as_bytes());
        line.push(SOH);
        push_number(&mut line, tags.size / 1024, STX);

        // A negative duration flags a variable bit rate stream
        if format.is_vbr() {
            line.push(b'-');
        }
        push_number(&mut line, tags.duration.floor() as u64, ETX);
        push_number(&mut line, (tags.sample_rate / 10) as u64, EOT);
        push_number(&mut line, tags.channel_mode_code() as u64, ENQ);
        push_number(&mut line, format.version_code() as u64, ACK);
        push_number(&mut line, format.layer_code(tags.bit_depth) as u64, BEL);
        line.push(NAK);

        for (text, terminator) in [
            (&tags.title, SYN),
            (&tags.artist, ETB),
            (&tags.album, CAN),
            (&tags.track, EM),
            (&tags.year, SUB),
            (&tags.comment, ESC),
            (&tags.genre, FS),
        ] {
            if let Some(text) = text {
                line.extend_from_slice(text.as_bytes());
            }
            line.push(terminator);
        }
        line.push(NL);
        self.emit(&line)
    }

    /// size (KB), duration (s), folder count and file count, each terminated
    fn push_totals(&self, line: &mut Vec<u8>, id: NodeId) {
        push_number(line, self.tree.size(id) / 1024, STX);
        push_number(line, self.tree.duration(id).floor() as u64, ETX);
        push_number(line, self.tree.folder_count(id), EOT);
        push_number(line, self.tree.file_count(id), ENQ);
    }

    fn indent(&self, id: NodeId) -> Vec<u8> {
        vec![TAB; self.tree.depth(id) - 1]
    }

    fn unexpected(&self, id: NodeId, parent_kind: &str) -> ScanError {
        let tree = self.tree;
        let node = tree.node(id);
        log::error!("Unknown {} {:?} in {}", node.kind().as_str(), node.name(), parent_kind);
        ScanError::structural(
            node.name(),
            format!("A {} cannot be written inside a {}", node.kind().as_str(), parent_kind),
        )
    }

    fn emit(&mut self, line: &[u8]) -> Result<(), ScanError> {
        self.out.write_all(line)?;
        self.observer.record_written();
        Ok(())
    }
}

fn push_number(line: &mut Vec<u8>, value: u64, terminator: u8) {
    line.extend_from_slice(value.to_string().as_bytes());
    line.push(terminator);
}
