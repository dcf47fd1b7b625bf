//! Stream direction and format tags.

use crate::error::{MsCompError, Result};
use std::str::FromStr;

/// Direction of a stream. Fixed when the stream starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Raw bytes in, compressed bytes out.
    Compress,
    /// Compressed bytes in, raw bytes out.
    Decompress,
}

impl Mode {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Compress => "compress",
            Self::Decompress => "decompress",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Compressed data format owned by a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// No compression: bytes are copied through unchanged.
    None,
    /// LZNT1, as used by NTFS and `RtlCompressBuffer`.
    Lznt1,
    /// Plain Xpress (MS-XCA LZ77 without Huffman).
    Xpress,
}

impl Format {
    /// All supported formats.
    pub const ALL: [Format; 3] = [Format::None, Format::Lznt1, Format::Xpress];

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Lznt1 => "lznt1",
            Self::Xpress => "xpress",
        }
    }

    /// Largest back-reference distance the format can express.
    pub fn window_size(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Lznt1 => 4096,
            Self::Xpress => 8192,
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Format {
    type Err = MsCompError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "stored" | "copy" => Ok(Self::None),
            "lznt1" => Ok(Self::Lznt1),
            "xpress" | "lz77" | "plain" => Ok(Self::Xpress),
            other => Err(MsCompError::invalid_argument(format!(
                "unknown format '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        for format in Format::ALL {
            assert_eq!(format.name().parse::<Format>().unwrap(), format);
            assert_eq!(format.to_string(), format.name());
        }
        assert_eq!("LZNT1".parse::<Format>().unwrap(), Format::Lznt1);
        assert!("deflate".parse::<Format>().is_err());
    }

    #[test]
    fn test_window_sizes() {
        assert_eq!(Format::Lznt1.window_size(), 4096);
        assert_eq!(Format::Xpress.window_size(), 8192);
        assert_eq!(Mode::Decompress.to_string(), "decompress");
    }
}
