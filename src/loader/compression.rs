//! Transparent decompression of schema dumps, picked by file suffix.

use std::fmt;
use std::io::{self, Read};
use std::path::Path;

/// Codec a dump file is wrapped in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl Compression {
    const SUFFIXES: [(&'static str, Compression); 8] = [
        ("gz", Compression::Gzip),
        ("gzip", Compression::Gzip),
        ("bz2", Compression::Bzip2),
        ("bzip2", Compression::Bzip2),
        ("xz", Compression::Xz),
        ("lzma", Compression::Xz),
        ("zst", Compression::Zstd),
        ("zstd", Compression::Zstd),
    ];

    /// Codec for a bare suffix such as `gz` (case-insensitive)
    pub fn from_suffix(suffix: &str) -> Self {
        Self::SUFFIXES
            .iter()
            .find(|(s, _)| s.eq_ignore_ascii_case(suffix))
            .map(|&(_, codec)| codec)
            .unwrap_or(Compression::None)
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_suffix)
            .unwrap_or(Compression::None)
    }

    /// `file_name` without its codec suffix: `shop.sql.gz` becomes `shop.sql`
    pub fn strip_suffix(file_name: &str) -> &str {
        match file_name.rsplit_once('.') {
            Some((stem, suffix)) if Self::from_suffix(suffix) != Compression::None => stem,
            _ => file_name,
        }
    }

    /// Decoding reader over `reader`
    pub fn wrap_reader<'a>(&self, reader: Box<dyn Read + 'a>) -> io::Result<Box<dyn Read + 'a>> {
        let decoded: Box<dyn Read + 'a> = match self {
            Compression::None => reader,
            Compression::Gzip => Box::new(flate2::read::MultiGzDecoder::new(reader)),
            Compression::Bzip2 => Box::new(bzip2::read::MultiBzDecoder::new(reader)),
            Compression::Xz => Box::new(xz2::read::XzDecoder::new_multi_decoder(reader)),
            Compression::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
        };
        Ok(decoded)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Compression::None => "plain",
            Compression::Gzip => "gzip",
            Compression::Bzip2 => "bzip2",
            Compression::Xz => "xz",
            Compression::Zstd => "zstd",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
