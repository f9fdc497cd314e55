//! Core data models shared by the builder, the tree and the writer

use serde::{Deserialize, Serialize};

/// Audio format recognized from the file name
///
/// Matching is case-sensitive on the extension, so `song.MP3` is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// MPEG-1 Layer 3 (`.mp3`)
    Mp3,
    /// Free Lossless Audio Codec (`.flac`)
    Flac,
    /// Anything else
    Other,
}

impl AudioFormat {
    /// Infer the format from a file name
    pub fn from_file_name(name: &str) -> Self {
        if name.ends_with(".mp3") {
            AudioFormat::Mp3
        } else if name.ends_with(".flac") {
            AudioFormat::Flac
        } else {
            AudioFormat::Other
        }
    }

    /// Whether files of this format become nodes in the collection
    pub fn is_recognized(&self) -> bool {
        !matches!(self, AudioFormat::Other)
    }

    /// MAC "MPEG version" code
    ///
    /// The manager uses 1 for MPEG V1 and 35 for FLAC; everything else is
    /// written as unknown.
    pub fn version_code(&self) -> u32 {
        match self {
            AudioFormat::Mp3 => 1,
            AudioFormat::Flac => 35,
            AudioFormat::Other => 0,
        }
    }

    /// MAC "MPEG layer" code derived from the bit depth
    ///
    /// FLAC stores the raw bit depth, MP3 is always layer 3. Without a bit
    /// depth the layer is unknown.
    pub fn layer_code(&self, bit_depth: Option<u32>) -> u32 {
        match (self, bit_depth) {
            (AudioFormat::Flac, Some(bits)) => bits,
            (AudioFormat::Mp3, Some(_)) => 3,
            _ => 0,
        }
    }

    /// Variable bit rate formats get a negative duration in the export
    pub fn is_vbr(&self) -> bool {
        matches!(self, AudioFormat::Flac)
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Flac => "flac",
            AudioFormat::Other => "other",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tag record returned by a tag extractor for one audio file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioTags {
    /// File size in bytes
    pub size: u64,
    /// Duration in seconds
    pub duration: f64,
    /// Sample rate in Hz
    pub sample_rate: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    /// Bits per sample, when the container reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_depth: Option<u32>,
    /// Channel count, when the container reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
}

impl AudioTags {
    /// Create a tag record with the mandatory stream properties
    pub fn new(size: u64, duration: f64, sample_rate: u32) -> Self {
        Self {
            size,
            duration,
            sample_rate,
            ..Default::default()
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the artist
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    /// Set the album
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    /// Set the channel count
    pub fn with_channels(mut self, channels: u32) -> Self {
        self.channels = Some(channels);
        self
    }

    /// Set the bit depth
    pub fn with_bit_depth(mut self, bits: u32) -> Self {
        self.bit_depth = Some(bits);
        self
    }

    /// MAC "channel mode" code: stereo is 1, everything else mono (4)
    pub fn channel_mode_code(&self) -> u32 {
        if self.channels == Some(2) {
            1
        } else {
            4
        }
    }
}

/// MAC volume type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeType {
    Removable,
    /// Fixed disk (HDD)
    #[default]
    Fixed,
    /// Network share
    Remote,
    CdRom,
    RamDisk,
    AudioCd,
}

impl VolumeType {
    /// Numeric code written in the volume record
    pub fn code(&self) -> u32 {
        match self {
            VolumeType::Removable => 1,
            VolumeType::Fixed => 2,
            VolumeType::Remote => 3,
            VolumeType::CdRom => 4,
            VolumeType::RamDisk => 5,
            VolumeType::AudioCd => 6,
        }
    }
}

/// Aggregate view of a built collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionSummary {
    /// Collection name
    pub name: String,
    /// Number of volumes directly under the collection
    pub volumes: usize,
    /// Folder count as written in the collection record
    pub folders: u64,
    /// Total number of audio files
    pub files: u64,
    /// Total size in bytes
    pub size: u64,
    /// Total duration in seconds
    pub duration: f64,
}

impl CollectionSummary {
    /// Size in kilobytes, as exported
    pub fn size_kb(&self) -> u64 {
        self.size / 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_format_from_file_name() {
        assert_eq!(AudioFormat::from_file_name("song.mp3"), AudioFormat::Mp3);
        assert_eq!(AudioFormat::from_file_name("song.flac"), AudioFormat::Flac);
        assert_eq!(AudioFormat::from_file_name("song.MP3"), AudioFormat::Other);
        assert_eq!(AudioFormat::from_file_name("cover.jpg"), AudioFormat::Other);
        assert_eq!(AudioFormat::from_file_name("mp3"), AudioFormat::Other);
    }

    #[test]
    fn test_codec_codes() {
        assert_eq!(AudioFormat::Mp3.version_code(), 1);
        assert_eq!(AudioFormat::Flac.version_code(), 35);
        assert_eq!(AudioFormat::Other.version_code(), 0);

        assert_eq!(AudioFormat::Flac.layer_code(Some(24)), 24);
        assert_eq!(AudioFormat::Flac.layer_code(None), 0);
        assert_eq!(AudioFormat::Mp3.layer_code(Some(16)), 3);
        assert_eq!(AudioFormat::Mp3.layer_code(None), 0);
        assert_eq!(AudioFormat::Other.layer_code(Some(16)), 0);
    }

    #[test]
    fn test_channel_mode_code() {
        let tags = AudioTags::new(0, 0.0, 44100);
        assert_eq!(tags.channel_mode_code(), 4);
        assert_eq!(tags.clone().with_channels(2).channel_mode_code(), 1);
        assert_eq!(tags.clone().with_channels(1).channel_mode_code(), 4);
        assert_eq!(tags.with_channels(6).channel_mode_code(), 4);
    }

    #[test]
    fn test_volume_type_codes() {
        assert_eq!(VolumeType::default(), VolumeType::Fixed);
        assert_eq!(VolumeType::Fixed.code(), 2);
        assert_eq!(VolumeType::AudioCd.code(), 6);
    }

    #[test]
    fn test_tags_serialization_skips_missing() {
        let tags = AudioTags::new(4096, 120.4, 44100).with_title("T");
        let json = serde_json::to_string(&tags).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["title"], "T");
        assert!(!json.contains("artist"));
    }
}
