//! Audio tag extraction
//!
//! The builder only sees the [`TagExtractor`] trait. The default
//! implementation probes files with symphonia.

use std::fs::{self, File};
use std::path::Path;

use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardTagKey};
use symphonia::core::probe::Hint;

use crate::error::ScanError;
use crate::models::AudioTags;

/// Reads the tag record of one audio file
pub trait TagExtractor {
    /// Extract size, stream properties and text tags from `path`
    fn extract(&self, path: &Path) -> Result<AudioTags, ScanError>;
}

/// Tag extractor backed by symphonia's format probe
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaExtractor;

impl SymphoniaExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TagExtractor for SymphoniaExtractor {
    fn extract(&self, path: &Path) -> Result<AudioTags, ScanError> {
        let size = fs::metadata(path)
            .map_err(|e| ScanError::extraction(path.to_path_buf(), e.to_string()))?
            .len();

        let file =
            File::open(path).map_err(|e| ScanError::extraction(path.to_path_buf(), e.to_string()))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(extension);
        }

        let mut probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| ScanError::extraction(path.to_path_buf(), e.to_string()))?;

        let track = probed
            .format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| ScanError::extraction(path.to_path_buf(), "No audio track found"))?;

        let params = &track.codec_params;
        let sample_rate = params
            .sample_rate
            .ok_or_else(|| ScanError::extraction(path.to_path_buf(), "No sample rate"))?;
        let duration = params
            .n_frames
            .map(|frames| frames as f64 / sample_rate as f64)
            .unwrap_or(0.0);

        let mut tags = AudioTags::new(size, duration, sample_rate);
        tags.bit_depth = params.bits_per_sample;
        tags.channels = params.channels.map(|c| c.count() as u32);

        // ID3v2 tags are read by the probe ahead of the container, Vorbis
        // comments live in the container. Container values win.
        if let Some(revision) = probed.metadata.get().as_ref().and_then(|m| m.current()) {
            apply_revision(&mut tags, revision);
        }
        if let Some(revision) = probed.format.metadata().current() {
            apply_revision(&mut tags, revision);
        }

        log::debug!(
            "Extracted {:?}: {:.1}s, {} Hz, {:?} bits, {:?} channels",
            path,
            tags.duration,
            tags.sample_rate,
            tags.bit_depth,
            tags.channels
        );

        Ok(tags)
    }
}

fn apply_revision(tags: &mut AudioTags, revision: &MetadataRevision) {
    for tag in revision.tags() {
        let value = tag.value.to_string();
        let (slot, value) = match tag.std_key {
            Some(StandardTagKey::TrackTitle) => (&mut tags.title, Some(value)),
            Some(StandardTagKey::Artist) => (&mut tags.artist, Some(value)),
            Some(StandardTagKey::Album) => (&mut tags.album, Some(value)),
            Some(StandardTagKey::TrackNumber) => (&mut tags.track, track_number(&value)),
            Some(StandardTagKey::Date) => (&mut tags.year, Some(value)),
            Some(StandardTagKey::Comment) => (&mut tags.comment, Some(value)),
            Some(StandardTagKey::Genre) => (&mut tags.genre, Some(value)),
            _ => continue,
        };
        *slot = value;
    }
}

/// Track tags are often written as "track/total"; only the track is kept.
fn track_number(value: &str) -> Option<String> {
    let track = value.split('/').next().unwrap_or_default().trim();
    if track.is_empty() {
        None
    } else {
        Some(track.to_string())
    }
}
