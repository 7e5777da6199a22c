//! Generic Buffered Reader, with integrated optional .gz decompression
use std::{
    fs::File,
    io::{BufRead, BufReader, Error, Read},
    path::Path,
};

#[cfg(feature = "flate2")]
use flate2::read::GzDecoder;

/// [BufferedReader] is an Input abstraction for seamless
/// readable or gzip compressed GPX/KML content.
#[derive(Debug)]
pub enum BufferedReader {
    /// Readable file
    Plain(BufReader<File>),
    /// gzip compressed file
    #[cfg(feature = "flate2")]
    Gz(BufReader<GzDecoder<File>>),
}

impl BufferedReader {
    /// Opens file located at `path`. Files ending with ".gz"
    /// are decompressed on the fly and require the flate2 feature.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let fd = File::open(path)?;
        let gzip = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("gz"))
            .unwrap_or(false);
        if gzip {
            #[cfg(feature = "flate2")]
            {
                Ok(Self::Gz(BufReader::new(GzDecoder::new(fd))))
            }
            #[cfg(not(feature = "flate2"))]
            {
                Err(Error::new(
                    std::io::ErrorKind::Unsupported,
                    "gzip compressed data requires the flate2 feature",
                ))
            }
        } else {
            Ok(Self::Plain(BufReader::new(fd)))
        }
    }
}

impl Read for BufferedReader {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        match self {
            Self::Plain(h) => h.read(buf),
            #[cfg(feature = "flate2")]
            Self::Gz(h) => h.read(buf),
        }
    }
}

impl BufRead for BufferedReader {
    fn fill_buf(&mut self) -> Result<&[u8], Error> {
        match self {
            Self::Plain(h) => h.fill_buf(),
            #[cfg(feature = "flate2")]
            Self::Gz(h) => h.fill_buf(),
        }
    }
    fn consume(&mut self, s: usize) {
        match self {
            Self::Plain(h) => h.consume(s),
            #[cfg(feature = "flate2")]
            Self::Gz(h) => h.consume(s),
        }
    }
}
