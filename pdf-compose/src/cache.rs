//! Binary font-cache codec.
//!
//! Cache files carry a parsed [`FontProgram`] so later runs can embed
//! a font without re-reading sfnt tables. All integers are big-endian.
//! The metrics block and the font program are stored deflate-framed;
//! see [`crate::deflate`] for the frame layout.

use std::path::Path;

use log::debug;

use crate::deflate;
use crate::font::{FontError, FontProgram};

/// Longest font name the one-byte length prefix can describe.
const MAX_NAME_LEN: usize = 0xFF;
/// Longest info text the three-byte length prefix can describe.
const MAX_INFO_LEN: usize = 0xFF_FFFF;

/// Serialize a font program into the cache format.
///
/// Fails with `InvalidFontProgram` when the name or info text does not
/// fit its length prefix. Nothing else about the program is checked;
/// table sizes are the embedder's concern.
pub fn encode(program: &FontProgram) -> Result<Vec<u8>, FontError> {
    let name = program.name.as_bytes();
    if name.len() > MAX_NAME_LEN {
        return Err(FontError::InvalidFontProgram(format!(
            "font name is {} bytes, the cache format allows {}",
            name.len(),
            MAX_NAME_LEN
        )));
    }
    let info = program.info.as_bytes();
    if info.len() > MAX_INFO_LEN {
        return Err(FontError::InvalidFontProgram(format!(
            "info text is {} bytes, the cache format allows {}",
            info.len(),
            MAX_INFO_LEN
        )));
    }

    let metrics = deflate::frame(&encode_metrics(program));
    let font_block = deflate::frame(&program.program_bytes);

    let mut out =
        Vec::with_capacity(name.len() + info.len() + metrics.len() + font_block.len() + 17);
    out.push(name.len() as u8);
    out.extend_from_slice(name);
    let info_len = info.len() as u32;
    out.push((info_len >> 16) as u8);
    out.push((info_len >> 8) as u8);
    out.push(info_len as u8);
    out.extend_from_slice(info);
    out.extend_from_slice(&(metrics.len() as u32).to_be_bytes());
    out.extend_from_slice(&metrics);
    out.push(if program.is_cff { b'Y' } else { b'N' });
    out.extend_from_slice(&(program.program_bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(&(font_block.len() as u32).to_be_bytes());
    out.extend_from_slice(&font_block);
    Ok(out)
}

/// Deserialize a cache image back into a font program.
///
/// Fails with `CorruptStream` when a declared length runs past the end
/// of the input, a framed block fails its checksum, or the outline
/// kind byte is unrecognized. Trailing bytes after the program block
/// are ignored.
pub fn decode(data: &[u8]) -> Result<FontProgram, FontError> {
    let mut cur = Cursor::new(data);

    let name_len = usize::from(cur.read_u8("name length")?);
    let name = read_text(cur.take(name_len, "font name")?)?;
    let info_len = cur.read_u24("info length")? as usize;
    let info = read_text(cur.take(info_len, "info text")?)?;

    let metrics_len = cur.read_u32("metrics block length")? as usize;
    let metrics = deflate::unframe(cur.take(metrics_len, "metrics block")?)?;
    let mut m = Cursor::new(&metrics);
    let units_per_em = m.read_i32("units per em")?;
    let bbox = [
        m.read_i32("bounding box")?,
        m.read_i32("bounding box")?,
        m.read_i32("bounding box")?,
        m.read_i32("bounding box")?,
    ];
    let ascent = m.read_i32("ascent")?;
    let descent = m.read_i32("descent")?;
    let first_char = m.read_i32("first char")?;
    let last_char = m.read_i32("last char")?;
    let cap_height = m.read_i32("cap height")?;
    let underline_position = m.read_i32("underline position")?;
    let underline_thickness = m.read_i32("underline thickness")?;
    let advance_width = m.read_u16_table("advance width table")?;
    let glyph_width = m.read_u16_table("glyph width table")?;
    let unicode_to_gid = m.read_u16_table("unicode table")?;

    let is_cff = match cur.read_u8("outline kind")? {
        b'Y' => true,
        b'N' => false,
        _ => return Err(FontError::CorruptStream("unrecognized outline kind")),
    };
    let program_raw_len = cur.read_u32("program length")? as usize;
    let program_len = cur.read_u32("compressed program length")? as usize;
    let program_bytes = deflate::unframe(cur.take(program_len, "program block")?)?;
    if program_bytes.len() != program_raw_len {
        // The declared raw length is a sizing hint in existing cache
        // files; the inflated length is authoritative.
        debug!(
            "cache declares {} raw program bytes, inflated {}",
            program_raw_len,
            program_bytes.len()
        );
    }

    Ok(FontProgram {
        name,
        info,
        units_per_em,
        bbox,
        ascent,
        descent,
        cap_height,
        underline_position,
        underline_thickness,
        first_char,
        last_char,
        advance_width,
        glyph_width,
        unicode_to_gid,
        is_cff,
        program_bytes,
    })
}

/// Read and decode a cache file.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<FontProgram, FontError> {
    let data = std::fs::read(path)?;
    decode(&data)
}

/// Encode a font program and write it to a cache file.
pub fn store_file<P: AsRef<Path>>(path: P, program: &FontProgram) -> Result<(), FontError> {
    let data = encode(program)?;
    std::fs::write(path, data)?;
    Ok(())
}

impl FontProgram {
    /// Serialize into the cache format. See [`encode`].
    pub fn to_cache_bytes(&self) -> Result<Vec<u8>, FontError> {
        encode(self)
    }

    /// Deserialize from the cache format. See [`decode`].
    pub fn from_cache_bytes(data: &[u8]) -> Result<Self, FontError> {
        decode(data)
    }
}

/// Raw metrics block: twelve scalar ints, then the three glyph tables,
/// each as a count followed by that many 16-bit entries.
fn encode_metrics(program: &FontProgram) -> Vec<u8> {
    let scalars = [
        program.units_per_em,
        program.bbox[0],
        program.bbox[1],
        program.bbox[2],
        program.bbox[3],
        program.ascent,
        program.descent,
        program.first_char,
        program.last_char,
        program.cap_height,
        program.underline_position,
        program.underline_thickness,
    ];
    let entries = program.advance_width.len()
        + program.glyph_width.len()
        + program.unicode_to_gid.len();
    let mut out = Vec::with_capacity(scalars.len() * 4 + 12 + entries * 2);
    for value in scalars {
        out.extend_from_slice(&value.to_be_bytes());
    }
    for table in [
        &program.advance_width,
        &program.glyph_width,
        &program.unicode_to_gid,
    ] {
        out.extend_from_slice(&(table.len() as u32).to_be_bytes());
        for &entry in table {
            out.extend_from_slice(&entry.to_be_bytes());
        }
    }
    out
}

fn read_text(bytes: &[u8]) -> Result<String, FontError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| FontError::CorruptStream("text field is not UTF-8"))
}

/// Bounds-checked reader over a byte slice.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Cursor { data, pos: 0 }
    }

    fn take(&mut self, len: usize, what: &'static str) -> Result<&'a [u8], FontError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(FontError::CorruptStream(what))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self, what: &'static str) -> Result<u8, FontError> {
        Ok(self.take(1, what)?[0])
    }

    fn read_u24(&mut self, what: &'static str) -> Result<u32, FontError> {
        let b = self.take(3, what)?;
        Ok(u32::from(b[0]) << 16 | u32::from(b[1]) << 8 | u32::from(b[2]))
    }

    fn read_u32(&mut self, what: &'static str) -> Result<u32, FontError> {
        let b = self.take(4, what)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_i32(&mut self, what: &'static str) -> Result<i32, FontError> {
        let b = self.take(4, what)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u16_table(&mut self, what: &'static str) -> Result<Vec<u16>, FontError> {
        let count = self.read_u32(what)? as usize;
        let byte_len = count
            .checked_mul(2)
            .ok_or(FontError::CorruptStream(what))?;
        let bytes = self.take(byte_len, what)?;
        Ok(bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_program() -> FontProgram {
        FontProgram {
            name: "Ab".to_string(),
            info: "ci".to_string(),
            units_per_em: 2048,
            bbox: [-10, -20, 30, 40],
            ascent: 1900,
            descent: -450,
            cap_height: 1400,
            underline_position: -300,
            underline_thickness: 100,
            first_char: 65,
            last_char: 66,
            advance_width: vec![1200, 500],
            glyph_width: vec![1000, 450],
            unicode_to_gid: vec![0, 5, 9],
            is_cff: false,
            program_bytes: b"\x00\x01\x00\x00 not a real sfnt".to_vec(),
        }
    }

    #[test]
    fn header_prefix_layout() {
        let image = encode(&tiny_program()).unwrap();
        assert_eq!(image[0], 2); // name length
        assert_eq!(&image[1..3], b"Ab");
        assert_eq!(&image[3..6], &[0, 0, 2]); // info length, 3-byte big-endian
        assert_eq!(&image[6..8], b"ci");
    }

    #[test]
    fn metrics_block_is_framed_and_leads_with_units_per_em() {
        let image = encode(&tiny_program()).unwrap();
        let comp_len =
            u32::from_be_bytes([image[8], image[9], image[10], image[11]]) as usize;
        let framed = &image[12..12 + comp_len];
        assert_eq!(&framed[..2], &[0x58, 0x85]);
        let metrics = deflate::unframe(framed).unwrap();
        assert_eq!(&metrics[..4], &2048i32.to_be_bytes());
    }

    #[test]
    fn outline_byte_follows_metrics_block() {
        let image = encode(&tiny_program()).unwrap();
        let comp_len =
            u32::from_be_bytes([image[8], image[9], image[10], image[11]]) as usize;
        assert_eq!(image[12 + comp_len], b'N');
    }

    #[test]
    fn raw_program_length_is_recorded() {
        let program = tiny_program();
        let image = encode(&program).unwrap();
        let comp_len =
            u32::from_be_bytes([image[8], image[9], image[10], image[11]]) as usize;
        let at = 12 + comp_len + 1;
        let raw_len =
            u32::from_be_bytes([image[at], image[at + 1], image[at + 2], image[at + 3]]);
        assert_eq!(raw_len as usize, program.program_bytes.len());
    }

    #[test]
    fn rejects_oversized_name() {
        let mut program = tiny_program();
        program.name = "N".repeat(256);
        let err = encode(&program).unwrap_err();
        assert!(matches!(err, FontError::InvalidFontProgram(_)));
    }
}
