//! CID-keyed composite font embedding.
//!
//! [`register`] turns a [`FontProgram`] into the five cross-referenced
//! objects a Unicode composite font needs: the embedded font-file
//! stream, its descriptor, a ToUnicode CMap, the CID font dictionary,
//! and the Type0 wrapper that page content refers to. Sub-objects are
//! shared between registrations matching under the active [`DedupKey`];
//! the Type0 wrapper is always freshly written.

use log::debug;

use crate::deflate;
use crate::font::{FontError, FontProgram};
use crate::writer::ObjectWriter;

/// Readers cap bfchar groups at 100 entries.
const BFCHAR_BLOCK: usize = 100;

/// How registrations are matched for sub-object sharing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupKey {
    /// Match by PostScript name. Assumes one program per name.
    #[default]
    FontName,
    /// Match by MD5 digest of the program bytes; tells same-name
    /// programs with different outlines apart.
    ContentDigest,
}

/// Object numbers of one embedded font.
///
/// `type0_obj` is the handle page content references; the optional
/// numbers are bookkeeping for sub-object sharing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontResource {
    /// PostScript name of the embedded program.
    pub name: String,
    /// Value the registry matches on under the active dedup policy.
    key: String,
    /// Embedded font-file stream.
    pub file_obj: Option<u32>,
    /// Font descriptor dictionary.
    pub descriptor_obj: Option<u32>,
    /// ToUnicode CMap stream.
    pub to_unicode_obj: Option<u32>,
    /// Descendant CID font dictionary.
    pub cid_font_obj: Option<u32>,
    /// Top-level Type0 dictionary.
    pub type0_obj: u32,
}

impl FontResource {
    /// Dedup key this resource was registered under.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Fonts embedded into one document, in registration order.
#[derive(Debug, Default)]
pub struct FontRegistry {
    entries: Vec<FontResource>,
}

impl FontRegistry {
    pub fn new() -> Self {
        FontRegistry::default()
    }

    /// First registered resource with the given program name.
    pub fn find_by_name(&self, name: &str) -> Option<&FontResource> {
        self.entries.iter().find(|r| r.name == name)
    }

    /// Record a completed registration. Entries are never removed.
    pub fn append(&mut self, resource: FontResource) {
        self.entries.push(resource);
    }

    pub fn iter(&self) -> impl Iterator<Item = &FontResource> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Embed `program`, sharing sub-objects with earlier registrations of
/// the same name. See [`register_with_key`] for the sharing rules.
pub fn register<W: ObjectWriter>(
    program: &FontProgram,
    registry: &mut FontRegistry,
    out: &mut W,
) -> Result<FontResource, FontError> {
    register_with_key(program, registry, out, DedupKey::FontName)
}

/// Embed `program` as a CID-keyed composite font.
///
/// Objects are written in dependency order: font file, descriptor,
/// ToUnicode CMap, CID font dictionary, Type0 wrapper. Each of the
/// first four is reused from any earlier registration that matches
/// under `dedup` and has that object recorded; the Type0 wrapper is
/// always freshly allocated. The completed resource is appended to
/// `registry` and returned.
///
/// Fails with `InvalidFontProgram`, before any object is written, if
/// the program's unicode table is not full-BMP sized or its advance
/// table is empty.
pub fn register_with_key<W: ObjectWriter>(
    program: &FontProgram,
    registry: &mut FontRegistry,
    out: &mut W,
    dedup: DedupKey,
) -> Result<FontResource, FontError> {
    program.validate()?;

    let key = match dedup {
        DedupKey::FontName => program.name.clone(),
        DedupKey::ContentDigest => format!("{:x}", md5::compute(&program.program_bytes)),
    };
    let scale = 1000.0 / f64::from(program.units_per_em);

    let file_obj = match shared_object(registry, &key, |r| r.file_obj) {
        Some(id) => id,
        None => write_font_file(program, out),
    };
    let descriptor_obj = match shared_object(registry, &key, |r| r.descriptor_obj) {
        Some(id) => id,
        None => write_descriptor(program, file_obj, out),
    };
    let to_unicode_obj = match shared_object(registry, &key, |r| r.to_unicode_obj) {
        Some(id) => id,
        None => write_to_unicode(program, out),
    };
    let cid_font_obj = match shared_object(registry, &key, |r| r.cid_font_obj) {
        Some(id) => id,
        None => write_cid_font(program, descriptor_obj, scale, out),
    };
    let type0_obj = write_type0(program, cid_font_obj, to_unicode_obj, out);

    debug!(
        "registered font {:?} as object {} (file {}, descriptor {}, tounicode {}, cid {})",
        program.name, type0_obj, file_obj, descriptor_obj, to_unicode_obj, cid_font_obj
    );

    let resource = FontResource {
        name: program.name.clone(),
        key,
        file_obj: Some(file_obj),
        descriptor_obj: Some(descriptor_obj),
        to_unicode_obj: Some(to_unicode_obj),
        cid_font_obj: Some(cid_font_obj),
        type0_obj,
    };
    registry.append(resource.clone());
    Ok(resource)
}

/// First object number recorded by a registration matching `key`.
fn shared_object(
    registry: &FontRegistry,
    key: &str,
    field: impl Fn(&FontResource) -> Option<u32>,
) -> Option<u32> {
    registry
        .iter()
        .find_map(|r| if r.key == key { field(r) } else { None })
}

fn write_font_file<W: ObjectWriter>(program: &FontProgram, out: &mut W) -> u32 {
    let framed = deflate::frame(&program.program_bytes);
    let metadata_obj = if program.info.is_empty() {
        None
    } else {
        out.add_metadata_object(&program.info)
    };

    let id = out.new_object();
    let mut dict = String::from("<<\n");
    if let Some(meta) = metadata_obj {
        dict.push_str(&format!("/Metadata {} 0 R\n", meta));
    }
    if program.is_cff {
        dict.push_str("/Subtype /CIDFontType0C\n");
    }
    dict.push_str("/Filter /FlateDecode\n");
    dict.push_str(&format!("/Length {}\n", framed.len()));
    if !program.is_cff {
        dict.push_str(&format!("/Length1 {}\n", program.program_bytes.len()));
    }
    dict.push_str(">>\nstream\n");
    out.append_str(&dict);
    out.append(&framed);
    out.append_str("\nendstream\n");
    out.close_object();
    id
}

fn write_descriptor<W: ObjectWriter>(program: &FontProgram, file_obj: u32, out: &mut W) -> u32 {
    let id = out.new_object();
    let mut dict = String::from("<<\n/Type /FontDescriptor\n");
    dict.push_str(&format!("/FontName /{}\n", program.name));
    if program.is_cff {
        dict.push_str(&format!("/FontFile3 {} 0 R\n", file_obj));
    } else {
        dict.push_str(&format!("/FontFile2 {} 0 R\n", file_obj));
    }
    dict.push_str("/Flags 32\n");
    dict.push_str(&format!(
        "/FontBBox [{} {} {} {}]\n",
        program.bbox[0], program.bbox[1], program.bbox[2], program.bbox[3]
    ));
    dict.push_str(&format!("/Ascent {}\n", program.ascent));
    dict.push_str(&format!("/Descent {}\n", program.descent));
    dict.push_str(&format!("/CapHeight {}\n", program.cap_height));
    dict.push_str("/ItalicAngle 0\n");
    dict.push_str("/StemV 79\n");
    dict.push_str(">>\n");
    out.append_str(&dict);
    out.close_object();
    id
}

fn write_to_unicode<W: ObjectWriter>(program: &FontProgram, out: &mut W) -> u32 {
    let cmap = to_unicode_cmap(program);
    let id = out.new_object();
    // The CMap stays uncompressed; its length must be declared.
    out.append_str(&format!("<<\n/Length {}\n>>\nstream\n", cmap.len()));
    out.append_str(&cmap);
    out.append_str("\nendstream\n");
    out.close_object();
    id
}

/// CMap text mapping glyph indexes back to BMP code points, batched
/// into bfchar groups of at most 100 lines.
fn to_unicode_cmap(program: &FontProgram) -> String {
    let mut cmap = String::new();
    cmap.push_str(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );

    let mappings: Vec<(usize, u16)> = program
        .unicode_to_gid
        .iter()
        .enumerate()
        .filter(|&(_, &gid)| gid != 0)
        .map(|(cp, &gid)| (cp, gid))
        .collect();

    for chunk in mappings.chunks(BFCHAR_BLOCK) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for &(cp, gid) in chunk {
            cmap.push_str(&format!("<{:04X}> <{:04X}>\n", gid, cp));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap
}

fn write_cid_font<W: ObjectWriter>(
    program: &FontProgram,
    descriptor_obj: u32,
    scale: f64,
    out: &mut W,
) -> u32 {
    let id = out.new_object();
    let mut dict = String::from("<<\n/Type /Font\n");
    if program.is_cff {
        dict.push_str("/Subtype /CIDFontType0\n");
    } else {
        dict.push_str("/Subtype /CIDFontType2\n");
    }
    dict.push_str(&format!("/BaseFont /{}\n", program.name));
    dict.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >>\n");
    dict.push_str(&format!("/FontDescriptor {} 0 R\n", descriptor_obj));
    let default_width = (scale * f64::from(program.advance_width[0])).round() as i64;
    dict.push_str(&format!("/DW {}\n", default_width));
    // One run covering every glyph from index 0 up.
    dict.push_str("/W [0 [");
    for (index, &advance) in program.advance_width.iter().enumerate() {
        if index > 0 {
            dict.push(' ');
        }
        let width = (scale * f64::from(advance)).round() as i64;
        dict.push_str(&width.to_string());
    }
    dict.push_str("]]\n");
    dict.push_str("/CIDToGIDMap /Identity\n");
    dict.push_str(">>\n");
    out.append_str(&dict);
    out.close_object();
    id
}

fn write_type0<W: ObjectWriter>(
    program: &FontProgram,
    cid_font_obj: u32,
    to_unicode_obj: u32,
    out: &mut W,
) -> u32 {
    let id = out.new_object();
    let mut dict = String::from("<<\n/Type /Font\n/Subtype /Type0\n");
    dict.push_str(&format!("/BaseFont /{}\n", program.name));
    dict.push_str("/Encoding /Identity-H\n");
    dict.push_str(&format!("/DescendantFonts [{} 0 R]\n", cid_font_obj));
    dict.push_str(&format!("/ToUnicode {} 0 R\n", to_unicode_obj));
    dict.push_str(">>\n");
    out.append_str(&dict);
    out.close_object();
    id
}
