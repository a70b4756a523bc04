use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::checksum::adler32;
use crate::font::FontError;

/// Fixed two-byte prefix of a framed block.
///
/// Readers skip the prefix without interpreting it, so the exact bytes
/// only matter for compatibility with cache files already on disk.
pub const FRAME_PREFIX: [u8; 2] = [0x58, 0x85];

/// Compress `raw` into a framed block: the fixed prefix, a raw deflate
/// stream, and the big-endian Adler-32 checksum of the uncompressed
/// input.
pub fn frame(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len() / 2 + 16);
    out.extend_from_slice(&FRAME_PREFIX);
    let mut encoder = DeflateEncoder::new(out, Compression::default());
    // Writing into a Vec cannot fail.
    encoder.write_all(raw).unwrap();
    let mut out = encoder.finish().unwrap();
    out.extend_from_slice(&adler32(raw).to_be_bytes());
    out
}

/// Decode a framed block, verifying the checksum trailer.
///
/// The prefix bytes are skipped without inspection, so blocks written
/// with a real zlib header decode too, as long as the deflate body and
/// trailer agree.
pub fn unframe(framed: &[u8]) -> Result<Vec<u8>, FontError> {
    if framed.len() < FRAME_PREFIX.len() + 4 {
        return Err(FontError::CorruptStream("framed block too short"));
    }
    let body = &framed[FRAME_PREFIX.len()..framed.len() - 4];
    let mut raw = Vec::with_capacity(body.len() * 2);
    DeflateDecoder::new(body)
        .read_to_end(&mut raw)
        .map_err(|_| FontError::CorruptStream("malformed deflate data"))?;

    let trailer = &framed[framed.len() - 4..];
    let declared = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    if adler32(&raw) != declared {
        return Err(FontError::CorruptStream("checksum mismatch"));
    }
    Ok(raw)
}
