use std::io::{self, Write};

use bzip2::{Decompress, Status};
use thiserror::Error;

const OUT_CHUNK: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum BunzipError {
    #[error("corrupt bzip2 stream: {0}")]
    Corrupt(#[source] bzip2::Error),

    /// The body ended before the stream's end marker.
    #[error("bzip2 stream ended early")]
    Truncated,

    /// The decoder stopped accepting input without reaching the end of a stream.
    #[error("bzip2 decoder made no progress")]
    Stalled,

    #[error("write failed: {0}")]
    Sink(#[source] io::Error),
}

/// Push-style bzip2 decoder: compressed chunks go in as they arrive from the
/// network and decompressed bytes are written straight through to `sink`.
///
/// Concatenated streams (as produced by parallel compressors) are decoded back
/// to back.
pub struct BunzipWriter<W> {
    raw: Decompress,
    out: Vec<u8>,
    sink: W,
    in_stream: bool,
    streams: usize,
}

impl<W: Write> BunzipWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            raw: Decompress::new(false),
            out: Vec::with_capacity(OUT_CHUNK),
            sink,
            in_stream: false,
            streams: 0,
        }
    }

    pub fn write_compressed(&mut self, mut input: &[u8]) -> Result<(), BunzipError> {
        if input.is_empty() {
            return Ok(());
        }
        loop {
            self.out.clear();
            let before = self.raw.total_in();
            let status = self
                .raw
                .decompress_vec(input, &mut self.out)
                .map_err(BunzipError::Corrupt)?;
            let consumed = (self.raw.total_in() - before) as usize;
            input = &input[consumed..];
            if consumed > 0 {
                self.in_stream = true;
            }
            if !self.out.is_empty() {
                self.sink.write_all(&self.out).map_err(BunzipError::Sink)?;
            }

            if status == Status::StreamEnd {
                self.in_stream = false;
                self.streams += 1;
                self.raw = Decompress::new(false);
                if input.is_empty() {
                    return Ok(());
                }
                continue;
            }

            // A full buffer may leave more output pending inside the decoder.
            if self.out.len() == self.out.capacity() {
                continue;
            }
            if input.is_empty() {
                return Ok(());
            }
            if consumed == 0 {
                return Err(BunzipError::Stalled);
            }
        }
    }

    /// Check that the last stream was complete and hand back the sink.
    pub fn finish(self) -> Result<W, BunzipError> {
        if self.in_stream || self.streams == 0 {
            return Err(BunzipError::Truncated);
        }
        Ok(self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bzip2::Compression;
    use bzip2::write::BzEncoder;

    fn compress(data: &[u8]) -> Vec<u8> {
        let mut encoder = BzEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 251) as u8).collect()
    }

    #[test]
    fn decodes_single_chunk() {
        let data = sample(10_000);
        let mut writer = BunzipWriter::new(Vec::new());
        writer.write_compressed(&compress(&data)).unwrap();
        assert_eq!(writer.finish().unwrap(), data);
    }

    #[test]
    fn decodes_byte_by_byte_and_large_outputs() {
        // Output well beyond one buffer so the drain loop runs.
        let data = sample(OUT_CHUNK * 5 + 17);
        let compressed = compress(&data);

        let mut writer = BunzipWriter::new(Vec::new());
        for chunk in compressed.chunks(7) {
            writer.write_compressed(chunk).unwrap();
        }
        assert_eq!(writer.finish().unwrap(), data);
    }

    #[test]
    fn decodes_concatenated_streams() {
        let mut compressed = compress(b"first half, ");
        compressed.extend(compress(b"second half"));

        let mut writer = BunzipWriter::new(Vec::new());
        writer.write_compressed(&compressed).unwrap();
        assert_eq!(writer.finish().unwrap(), b"first half, second half");
    }

    #[test]
    fn truncated_stream_is_detected_on_finish() {
        let compressed = compress(&sample(4_096));
        let mut writer = BunzipWriter::new(Vec::new());
        writer
            .write_compressed(&compressed[..compressed.len() / 2])
            .unwrap();
        assert!(matches!(writer.finish(), Err(BunzipError::Truncated)));
    }

    #[test]
    fn empty_body_is_truncated() {
        let writer = BunzipWriter::new(Vec::new());
        assert!(matches!(writer.finish(), Err(BunzipError::Truncated)));
    }

    #[test]
    fn garbage_is_corrupt() {
        let mut writer = BunzipWriter::new(Vec::new());
        let err = writer
            .write_compressed(b"this is definitely not bzip2 data")
            .unwrap_err();
        assert!(matches!(err, BunzipError::Corrupt(_)));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("corrupt bzip2 stream"));
    }
}
