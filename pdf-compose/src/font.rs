use std::fmt;
use std::io;
use std::path::Path;

use log::{debug, trace};

/// Number of code points in the Basic Multilingual Plane; the required
/// length of [`FontProgram::unicode_to_gid`].
pub const UNICODE_TABLE_LEN: usize = 0x1_0000;

/// Errors produced by the font subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontError {
    /// A compressed block or cache image is truncated, fails its
    /// checksum, or declares lengths past the end of the input.
    CorruptStream(&'static str),
    /// A font program violates a structural requirement.
    InvalidFontProgram(String),
    /// The input bytes are not a usable sfnt font.
    UnsupportedFont(String),
    /// An underlying file operation failed.
    Io(String),
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontError::CorruptStream(what) => {
                write!(f, "corrupt stream: {}", what)
            }
            FontError::InvalidFontProgram(why) => {
                write!(f, "invalid font program: {}", why)
            }
            FontError::UnsupportedFont(why) => {
                write!(f, "unsupported font: {}", why)
            }
            FontError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for FontError {}

impl From<io::Error> for FontError {
    fn from(err: io::Error) -> Self {
        FontError::Io(err.to_string())
    }
}

/// Opaque handle to a font added to a PdfDocument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontId(pub usize);

/// A font ready for embedding.
///
/// Metric fields are in font design units (`units_per_em` per em).
/// `unicode_to_gid` holds one entry per BMP code point, zero where
/// unmapped. Programs come from [`FontProgram::parse`] or from the
/// cache codec in [`crate::cache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontProgram {
    /// PostScript name, used in descriptor and font dictionaries.
    pub name: String,
    /// Licensing and provenance text, carried into document metadata.
    pub info: String,
    pub units_per_em: i32,
    /// Bounding box over all glyphs: llx, lly, urx, ury.
    pub bbox: [i32; 4],
    pub ascent: i32,
    pub descent: i32,
    pub cap_height: i32,
    pub underline_position: i32,
    pub underline_thickness: i32,
    /// Lowest mapped code point.
    pub first_char: i32,
    /// Highest mapped code point.
    pub last_char: i32,
    /// Advance width per glyph index; index 0 is .notdef.
    pub advance_width: Vec<u16>,
    /// Outline extent per glyph index, kept for cache round-trips.
    pub glyph_width: Vec<u16>,
    /// BMP code point to glyph index.
    pub unicode_to_gid: Vec<u16>,
    /// True for CFF/PostScript outlines, false for TrueType.
    pub is_cff: bool,
    /// Full sfnt bytes, or the bare `CFF ` table when `is_cff`.
    pub program_bytes: Vec<u8>,
}

impl FontProgram {
    /// Parse a TrueType/OpenType font from raw bytes.
    ///
    /// Collections are read at face index 0. For CFF-flavoured fonts
    /// the embeddable program is the bare `CFF ` table; for TrueType
    /// it is the full input.
    pub fn parse(data: &[u8]) -> Result<Self, FontError> {
        let face = ttf_parser::Face::parse(data, 0)
            .map_err(|e| FontError::UnsupportedFont(format!("cannot parse font: {}", e)))?;

        let name = name_record(&face, ttf_parser::name_id::POST_SCRIPT_NAME)
            .or_else(|| {
                name_record(&face, ttf_parser::name_id::FAMILY).map(|n| n.replace(' ', ""))
            })
            .unwrap_or_else(|| "Unknown".to_string());

        // Notice strings end up in the document's metadata stream.
        let info = [
            ttf_parser::name_id::COPYRIGHT_NOTICE,
            ttf_parser::name_id::TRADEMARK,
            ttf_parser::name_id::LICENSE,
        ]
        .iter()
        .filter_map(|&id| name_record(&face, id))
        .collect::<Vec<_>>()
        .join(" ");

        let subtables = face
            .tables()
            .cmap
            .ok_or_else(|| FontError::UnsupportedFont("font has no cmap table".to_string()))?;

        let mut unicode_to_gid = vec![0u16; UNICODE_TABLE_LEN];
        let mut has_unicode = false;
        for subtable in subtables.subtables {
            if !subtable.is_unicode() {
                continue;
            }
            has_unicode = true;
            subtable.codepoints(|cp| {
                if let Some(gid) = subtable.glyph_index(cp) {
                    if let Some(slot) = unicode_to_gid.get_mut(cp as usize) {
                        *slot = gid.0;
                    }
                }
            });
        }
        if !has_unicode {
            return Err(FontError::UnsupportedFont(
                "font has no Unicode cmap subtable".to_string(),
            ));
        }

        let first_char = unicode_to_gid.iter().position(|&g| g != 0).unwrap_or(0);
        let last_char = unicode_to_gid.iter().rposition(|&g| g != 0).unwrap_or(0);

        let units_per_em = i32::from(face.units_per_em());
        let ascent = i32::from(face.ascender());
        let descent = i32::from(face.descender());
        let bbox = face.global_bounding_box();
        let cap_height = face.capital_height().map(i32::from).unwrap_or(ascent);
        let (underline_position, underline_thickness) = face
            .underline_metrics()
            .map(|m| (i32::from(m.position), i32::from(m.thickness)))
            .unwrap_or((0, 0));

        let glyph_count = face.number_of_glyphs();
        let mut advance_width = Vec::with_capacity(usize::from(glyph_count));
        let mut glyph_width = Vec::with_capacity(usize::from(glyph_count));
        for index in 0..glyph_count {
            let gid = ttf_parser::GlyphId(index);
            advance_width.push(face.glyph_hor_advance(gid).unwrap_or(0));
            let extent = face
                .glyph_bounding_box(gid)
                .map(|b| i32::from(b.x_max) - i32::from(b.x_min))
                .unwrap_or(0)
                .clamp(0, i32::from(u16::MAX));
            glyph_width.push(extent as u16);
        }

        let is_cff = face.tables().cff.is_some();
        let program_bytes = if is_cff {
            face.raw_face()
                .table(ttf_parser::Tag::from_bytes(b"CFF "))
                .map(|t| t.to_vec())
                .ok_or_else(|| {
                    FontError::UnsupportedFont("CFF outlines without a CFF table".to_string())
                })?
        } else {
            data.to_vec()
        };

        debug!(
            "parsed font {:?}: {} glyphs, {} units/em",
            name, glyph_count, units_per_em
        );

        Ok(FontProgram {
            name,
            info,
            units_per_em,
            bbox: [
                i32::from(bbox.x_min),
                i32::from(bbox.y_min),
                i32::from(bbox.x_max),
                i32::from(bbox.y_max),
            ],
            ascent,
            descent,
            cap_height,
            underline_position,
            underline_thickness,
            first_char: first_char as i32,
            last_char: last_char as i32,
            advance_width,
            glyph_width,
            unicode_to_gid,
            is_cff,
            program_bytes,
        })
    }

    /// Read and parse a font file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FontError> {
        let data = std::fs::read(path)?;
        FontProgram::parse(&data)
    }

    /// Check the structural requirements the embedder relies on: a
    /// full-BMP `unicode_to_gid` table and a nonempty advance table
    /// (index 0 supplies the default width).
    pub fn validate(&self) -> Result<(), FontError> {
        if self.unicode_to_gid.len() != UNICODE_TABLE_LEN {
            return Err(FontError::InvalidFontProgram(format!(
                "unicode table has {} entries, expected {}",
                self.unicode_to_gid.len(),
                UNICODE_TABLE_LEN
            )));
        }
        if self.advance_width.is_empty() {
            return Err(FontError::InvalidFontProgram(
                "advance width table is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Glyph index for a character: 0 (.notdef) when unmapped or
    /// outside the BMP.
    pub fn glyph_id(&self, ch: char) -> u16 {
        self.unicode_to_gid.get(ch as usize).copied().unwrap_or(0)
    }

    /// Advance width of a glyph in design units. Out-of-range glyph
    /// indexes fall back to the .notdef width.
    pub fn advance(&self, gid: u16) -> u16 {
        self.advance_width
            .get(usize::from(gid))
            .or_else(|| self.advance_width.first())
            .copied()
            .unwrap_or(0)
    }

    /// Scale factor from design units to PDF glyph space (1000/em).
    pub fn unit_scale(&self) -> f64 {
        1000.0 / f64::from(self.units_per_em)
    }

    /// Measure text width in points.
    pub fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        let total: u32 = text
            .chars()
            .map(|ch| u32::from(self.advance(self.glyph_id(ch))))
            .sum();
        f64::from(total) * font_size / f64::from(self.units_per_em)
    }

    /// Line height for a given font size using ascent - descent.
    pub fn line_height(&self, font_size: f64) -> f64 {
        f64::from(self.ascent - self.descent) * font_size / f64::from(self.units_per_em)
    }

    /// Ascender height in points; the first baseline in a text box
    /// sits this far below the box's top edge.
    pub fn ascent_points(&self, font_size: f64) -> f64 {
        f64::from(self.ascent) * font_size / f64::from(self.units_per_em)
    }

    /// Encode text as hex glyph indexes: `<00480065006C006C006F>`.
    pub fn encode_text_hex(&self, text: &str) -> String {
        let mut hex = String::with_capacity(text.len() * 5 + 2);
        hex.push('<');
        for ch in text.chars() {
            let gid = self.glyph_id(ch);
            if gid == 0 {
                trace!("font {:?}: no glyph for U+{:04X}", self.name, u32::from(ch));
            }
            hex.push_str(&format!("{:04X}", gid));
        }
        hex.push('>');
        hex
    }
}

/// Extract a Unicode entry from the name table.
fn name_record(face: &ttf_parser::Face, id: u16) -> Option<String> {
    face.names()
        .into_iter()
        .find(|name| name.name_id == id && name.is_unicode())
        .and_then(|name| name.to_string())
}
