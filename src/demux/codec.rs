//! # Codec marker table.
//!
//! Maps image codec names to the two bytes that close every encoded image:
//!
//! | codec                                  | marker        |
//! |----------------------------------------|---------------|
//! | `mjpeg`, `jpeg2000`, `jpegls`, `ljpeg` | `0xFF 0xD9`   |
//! | `png`                                  | `0x60 0x82`   |
//! | `tiff`                                 | `0x00 0x00`   |
//! | `gif`                                  | `0x00 0x3B`   |
//!
//! Any other name yields no marker; the channel then runs in passthrough mode.

use std::fmt;

/// Two trailing bytes that terminate one frame.
pub type Marker = [u8; 2];

/// Image codecs with a known end-of-image marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    Mjpeg,
    Jpeg2000,
    JpegLs,
    Ljpeg,
    Png,
    Tiff,
    Gif,
}

impl Codec {
    /// Every codec in the table.
    pub const ALL: [Codec; 7] = [
        Codec::Mjpeg,
        Codec::Jpeg2000,
        Codec::JpegLs,
        Codec::Ljpeg,
        Codec::Png,
        Codec::Tiff,
        Codec::Gif,
    ];

    /// Looks up a codec by its transcoder name (case-sensitive, as passed to `-c:v`).
    ///
    /// ```
    /// use pipevisor::Codec;
    ///
    /// assert_eq!(Codec::from_name("png"), Some(Codec::Png));
    /// assert_eq!(Codec::from_name("h264"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mjpeg" => Some(Codec::Mjpeg),
            "jpeg2000" => Some(Codec::Jpeg2000),
            "jpegls" => Some(Codec::JpegLs),
            "ljpeg" => Some(Codec::Ljpeg),
            "png" => Some(Codec::Png),
            "tiff" => Some(Codec::Tiff),
            "gif" => Some(Codec::Gif),
            _ => None,
        }
    }

    /// Transcoder name of the codec.
    pub fn name(self) -> &'static str {
        match self {
            Codec::Mjpeg => "mjpeg",
            Codec::Jpeg2000 => "jpeg2000",
            Codec::JpegLs => "jpegls",
            Codec::Ljpeg => "ljpeg",
            Codec::Png => "png",
            Codec::Tiff => "tiff",
            Codec::Gif => "gif",
        }
    }

    /// End-of-image marker for this codec.
    pub fn marker(self) -> Marker {
        match self {
            Codec::Mjpeg | Codec::Jpeg2000 | Codec::JpegLs | Codec::Ljpeg => [0xFF, 0xD9],
            Codec::Png => [0x60, 0x82],
            Codec::Tiff => [0x00, 0x00],
            Codec::Gif => [0x00, 0x3B],
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How one channel's byte stream is republished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelMode {
    /// Chunks are emitted unchanged, as they arrive.
    #[default]
    Passthrough,
    /// Chunks are accumulated until one ends with the marker.
    Demux(Marker),
}

impl ChannelMode {
    /// Resolves a codec name; unknown names degrade to [`ChannelMode::Passthrough`].
    ///
    /// ```
    /// use pipevisor::ChannelMode;
    ///
    /// assert_eq!(ChannelMode::from_codec_name("mjpeg"), ChannelMode::Demux([0xFF, 0xD9]));
    /// assert_eq!(ChannelMode::from_codec_name("rawvideo"), ChannelMode::Passthrough);
    /// ```
    pub fn from_codec_name(name: &str) -> Self {
        Codec::from_name(name)
            .map(ChannelMode::from)
            .unwrap_or(ChannelMode::Passthrough)
    }

    /// Resolves a boolean flag: `true` demuxes JPEG frames, `false` passes through.
    pub fn from_flag(flag: bool) -> Self {
        if flag {
            ChannelMode::from(Codec::Mjpeg)
        } else {
            ChannelMode::Passthrough
        }
    }

    /// Marker in use, if any.
    pub fn marker(&self) -> Option<Marker> {
        match self {
            ChannelMode::Passthrough => None,
            ChannelMode::Demux(m) => Some(*m),
        }
    }
}

impl From<Codec> for ChannelMode {
    fn from(codec: Codec) -> Self {
        ChannelMode::Demux(codec.marker())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpeg_family_shares_marker() {
        for name in ["mjpeg", "jpeg2000", "jpegls", "ljpeg"] {
            assert_eq!(
                ChannelMode::from_codec_name(name),
                ChannelMode::Demux([0xFF, 0xD9]),
                "codec {name}"
            );
        }
    }

    #[test]
    fn test_other_markers() {
        assert_eq!(Codec::Png.marker(), [0x60, 0x82]);
        assert_eq!(Codec::Tiff.marker(), [0x00, 0x00]);
        assert_eq!(Codec::Gif.marker(), [0x00, 0x3B]);
    }

    #[test]
    fn test_names_resolve_back() {
        for codec in Codec::ALL {
            assert_eq!(Codec::from_name(codec.name()), Some(codec));
        }
    }

    #[test]
    fn test_unknown_codec_is_passthrough() {
        assert_eq!(ChannelMode::from_codec_name(""), ChannelMode::Passthrough);
        assert_eq!(ChannelMode::from_codec_name("MJPEG"), ChannelMode::Passthrough);
        assert_eq!(ChannelMode::from_codec_name("h264"), ChannelMode::Passthrough);
    }

    #[test]
    fn test_flag() {
        assert_eq!(ChannelMode::from_flag(true).marker(), Some([0xFF, 0xD9]));
        assert_eq!(ChannelMode::from_flag(false), ChannelMode::Passthrough);
    }
}
