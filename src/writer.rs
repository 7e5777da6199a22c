//! Generic Buffered Writer, for efficient GPX production,
//! with integrated optional .gz compression
use std::io::{BufWriter, Error, Write};

#[cfg(feature = "flate2")]
use flate2::{write::GzEncoder, Compression};

/// [BufferedWriter] is an Output abstraction to propose seamless
/// readable and gzip compressed content streaming.
#[derive(Debug)]
pub enum BufferedWriter<W: Write> {
    /// Readable stream
    Plain(BufWriter<W>),
    /// Gzip compressed stream (non readable)
    #[cfg(feature = "flate2")]
    Gz(BufWriter<GzEncoder<W>>),
}

impl<W: Write> BufferedWriter<W> {
    /// Creates new Readable [BufferedWriter]
    pub fn plain(w: W) -> Self {
        Self::Plain(BufWriter::new(w))
    }
    #[cfg(feature = "flate2")]
    /// Creates new [BufferedWriter] to stream gzip encoded content with
    /// desired compression level. The higher the order, the lower the performance.
    pub fn gzip(w: W, compression_level: u32) -> Self {
        Self::Gz(BufWriter::new(GzEncoder::new(
            w,
            Compression::new(compression_level),
        )))
    }
    /// Flushes all buffered content and terminates the stream
    /// (writes the gzip trailer, if any).
    pub fn finish(self) -> Result<(), Error> {
        match self {
            Self::Plain(writer) => {
                writer.into_inner().map_err(|e| e.into_error())?.flush()
            },
            #[cfg(feature = "flate2")]
            Self::Gz(writer) => {
                let encoder = writer.into_inner().map_err(|e| e.into_error())?;
                encoder.finish()?.flush()
            },
        }
    }
}

impl<W: Write> Write for BufferedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        match self {
            Self::Plain(ref mut writer) => writer.write(buf),
            #[cfg(feature = "flate2")]
            Self::Gz(ref mut writer) => writer.write(buf),
        }
    }
    fn flush(&mut self) -> Result<(), Error> {
        match self {
            Self::Plain(ref mut writer) => writer.flush(),
            #[cfg(feature = "flate2")]
            Self::Gz(ref mut writer) => writer.flush(),
        }
    }
}
