//! Compression detection for the input stream.

use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};

use tracing::debug;

use crate::error::TarcheckError;

/// Magic number opening every zstd frame.
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

pub fn is_zstd_magic(header: &[u8]) -> bool {
    header == ZSTD_MAGIC
}

/// Decompressed view over an archive source, positioned at its first tar block.
pub enum ArchiveStream<R: Read> {
    Raw(R),
    Zstd(BufReader<zstd::stream::read::Decoder<'static, BufReader<R>>>),
}

impl<R: Read> ArchiveStream<R> {
    pub fn is_compressed(&self) -> bool {
        matches!(self, ArchiveStream::Zstd(_))
    }
}

impl<R: Read> Read for ArchiveStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ArchiveStream::Raw(inner) => inner.read(buf),
            ArchiveStream::Zstd(decoder) => decoder.read(buf),
        }
    }
}

/// Sniff the first four bytes of `source`, rewind it, and wrap it in a zstd
/// decoder when the frame magic is present. The decoder is primed here so a
/// corrupt frame header fails as a decoder error rather than a tar error.
pub fn open_stream<R: Read + Seek>(mut source: R) -> Result<ArchiveStream<R>, TarcheckError> {
    let mut header = [0u8; 4];
    source
        .read_exact(&mut header)
        .map_err(TarcheckError::ReadHeader)?;
    source
        .seek(SeekFrom::Start(0))
        .map_err(TarcheckError::Rewind)?;

    if is_zstd_magic(&header) {
        debug!("zstd frame magic found, decompressing");
        let decoder =
            zstd::stream::read::Decoder::new(source).map_err(TarcheckError::Decoder)?;
        let mut decoder = BufReader::new(decoder);
        decoder.fill_buf().map_err(TarcheckError::Decoder)?;
        Ok(ArchiveStream::Zstd(decoder))
    } else {
        debug!(header = ?header, "no zstd magic, reading raw tar");
        Ok(ArchiveStream::Raw(source))
    }
}
