use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::cache;
use crate::deflate;
use crate::embed::{self, DedupKey, FontRegistry, FontResource};
use crate::font::{FontError, FontId, FontProgram};
use crate::graphics::Color;
use crate::images::{self, ImageFit, ImageId};
use crate::textflow::{FitResult, Rect, TextFlow, TextStyle};
use crate::writer::{escape_pdf_string, ObjectWriter, PdfWriter};

/// High-level API for building PDF documents.
///
/// Generic over `Write` so it works with files (`BufWriter<File>`),
/// in-memory buffers (`Vec<u8>`), or any other writer.
///
/// Fonts and images become indirect objects as soon as they are
/// added; page content streams follow when each page closes. The
/// whole file body is buffered and flushed once by `end_document`,
/// which also writes the page tree, catalog, xref table, and
/// trailer.
pub struct PdfDocument<W: Write> {
    out: W,
    writer: PdfWriter,
    info: Vec<(String, String)>,
    registry: FontRegistry,
    fonts: Vec<LoadedFont>,
    images: Vec<LoadedImage>,
    pages: Vec<PendingPage>,
    current_page: Option<PageBuilder>,
    compress_content: bool,
}

/// A font registered on the document: parsed metrics paired with
/// the PDF objects that embed it.
pub(crate) struct LoadedFont {
    pub(crate) program: FontProgram,
    pub(crate) resource: FontResource,
}

struct LoadedImage {
    width: u32,
    height: u32,
    xobject_obj: u32,
}

struct PageBuilder {
    width: f64,
    height: f64,
    content_ops: Vec<u8>,
    fonts_used: BTreeSet<FontId>,
    images_used: BTreeSet<ImageId>,
}

/// A closed page awaiting the page tree: its content stream is
/// already written, only the page dictionary remains.
struct PendingPage {
    width: f64,
    height: f64,
    content_obj: u32,
    font_objs: Vec<u32>,
    image_objs: Vec<u32>,
}

impl PdfDocument<BufWriter<File>> {
    /// Create a new PDF document that writes to a file.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> PdfDocument<W> {
    /// Create a new PDF document that writes to the given writer.
    pub fn new(out: W) -> Self {
        PdfDocument {
            out,
            writer: PdfWriter::new(),
            info: Vec::new(),
            registry: FontRegistry::new(),
            fonts: Vec::new(),
            images: Vec::new(),
            pages: Vec::new(),
            current_page: None,
            compress_content: false,
        }
    }

    /// Set a document info entry (e.g. "Creator", "Title").
    pub fn set_info(&mut self, key: &str, value: &str) -> &mut Self {
        self.info.push((key.to_string(), value.to_string()));
        self
    }

    /// Toggle deflate compression of page content streams.
    /// Font and image streams are always compressed.
    pub fn set_compression(&mut self, on: bool) -> &mut Self {
        self.compress_content = on;
        self
    }

    /// Register a parsed font program with the document, embedding
    /// it as a CID-keyed composite font. Sub-objects are shared with
    /// previous registrations that match by PostScript name.
    pub fn add_font(&mut self, program: FontProgram) -> Result<FontId, FontError> {
        self.add_font_with_key(program, DedupKey::FontName)
    }

    /// Like `add_font`, with an explicit sub-object sharing policy.
    pub fn add_font_with_key(
        &mut self,
        program: FontProgram,
        dedup: DedupKey,
    ) -> Result<FontId, FontError> {
        let resource = embed::register_with_key(
            &program,
            &mut self.registry,
            &mut self.writer,
            dedup,
        )?;
        let id = FontId(self.fonts.len());
        self.fonts.push(LoadedFont { program, resource });
        Ok(id)
    }

    /// Load a `.ttf`/`.otf` file and register it.
    pub fn load_font_file<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<FontId, FontError> {
        let program = FontProgram::load(path)?;
        self.add_font(program)
    }

    /// Parse font bytes and register them.
    pub fn load_font_bytes(&mut self, data: &[u8]) -> Result<FontId, FontError> {
        let program = FontProgram::parse(data)?;
        self.add_font(program)
    }

    /// Load a pre-parsed font from a cache file and register it.
    /// Decoding the cache skips the sfnt parse entirely.
    pub fn load_font_cached<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<FontId, FontError> {
        let program = cache::load_file(path)?;
        self.add_font(program)
    }

    /// Store a registered font as a cache file for later reuse.
    pub fn store_font_cache<P: AsRef<Path>>(
        &self,
        font: FontId,
        path: P,
    ) -> Result<(), FontError> {
        cache::store_file(path, &self.fonts[font.0].program)
    }

    /// Load an image file (JPEG or PNG) and embed it as an XObject.
    /// The object is written once; placements reference it.
    pub fn load_image_file<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> io::Result<ImageId> {
        let data = std::fs::read(path)?;
        self.load_image_bytes(data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Parse image bytes (JPEG or PNG) and embed them as an XObject.
    pub fn load_image_bytes(&mut self, data: Vec<u8>) -> Result<ImageId, String> {
        let image = images::load_image(data)?;
        let xobject_obj = images::write_xobject(&image, &mut self.writer);
        let id = ImageId(self.images.len());
        self.images.push(LoadedImage {
            width: image.width,
            height: image.height,
            xobject_obj,
        });
        Ok(id)
    }

    /// Begin a new page with the given dimensions in points.
    /// If a page is currently open, it is automatically closed.
    pub fn begin_page(&mut self, width: f64, height: f64) -> &mut Self {
        if self.current_page.is_some() {
            self.end_page();
        }
        self.current_page = Some(PageBuilder {
            width,
            height,
            content_ops: Vec::new(),
            fonts_used: BTreeSet::new(),
            images_used: BTreeSet::new(),
        });
        self
    }

    /// Place text at position (x, y) in the given style.
    /// Coordinates use PDF's default bottom-left origin.
    pub fn place_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        style: &TextStyle,
    ) -> &mut Self {
        let loaded = &self.fonts[style.font.0];
        let ops = format!(
            "BT\n/F{} {} Tf\n{} {} Td\n{} Tj\nET\n",
            loaded.resource.type0_obj,
            format_coord(style.font_size),
            format_coord(x),
            format_coord(y),
            loaded.program.encode_text_hex(text),
        );
        let page = self
            .current_page
            .as_mut()
            .expect("place_text called with no open page");
        page.content_ops.extend_from_slice(ops.as_bytes());
        page.fonts_used.insert(style.font);
        self
    }

    /// Width of `text` in points when set in the given style.
    pub fn measure_text(&self, text: &str, style: &TextStyle) -> f64 {
        self.fonts[style.font.0]
            .program
            .measure_text(text, style.font_size)
    }

    /// Fit a TextFlow into a bounding rectangle on the current
    /// page. The flow's cursor advances so subsequent calls
    /// continue where it left off (for multi-page flow).
    pub fn fit_textflow(&mut self, flow: &mut TextFlow, rect: &Rect) -> FitResult {
        let (ops, result, used) = flow.generate_content_ops(rect, &self.fonts);
        let page = self
            .current_page
            .as_mut()
            .expect("fit_textflow called with no open page");
        page.content_ops.extend_from_slice(&ops);
        page.fonts_used.extend(used);
        result
    }

    /// Place an embedded image into a bounding rectangle on the
    /// current page. The rect's (x, y) is its upper-left corner
    /// measured from the top of the page.
    pub fn place_image(
        &mut self,
        image: &ImageId,
        rect: &Rect,
        fit: ImageFit,
    ) -> &mut Self {
        let img = &self.images[image.0];
        let page = self
            .current_page
            .as_mut()
            .expect("place_image called with no open page");
        let placement =
            images::calculate_placement(img.width, img.height, rect, fit, page.height);

        let mut ops = String::from("q\n");
        if let Some(clip) = &placement.clip {
            ops.push_str(&format!(
                "{} {} {} {} re\nW n\n",
                format_coord(clip.x),
                format_coord(clip.y),
                format_coord(clip.width),
                format_coord(clip.height),
            ));
        }
        ops.push_str(&format!(
            "{} 0 0 {} {} {} cm\n/Im{} Do\nQ\n",
            format_coord(placement.width),
            format_coord(placement.height),
            format_coord(placement.x),
            format_coord(placement.y),
            img.xobject_obj,
        ));
        page.content_ops.extend_from_slice(ops.as_bytes());
        page.images_used.insert(*image);
        self
    }

    /// Set the stroke color for subsequent path operations.
    pub fn set_stroke_color(&mut self, color: Color) -> &mut Self {
        self.push_ops(&color.stroke_op());
        self
    }

    /// Set the fill color for subsequent path operations.
    pub fn set_fill_color(&mut self, color: Color) -> &mut Self {
        self.push_ops(&color.fill_op());
        self
    }

    /// Set the line width in points.
    pub fn set_line_width(&mut self, width: f64) -> &mut Self {
        self.push_ops(&format!("{} w\n", format_coord(width)));
        self
    }

    /// Begin a new path at (x, y).
    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.push_ops(&format!("{} {} m\n", format_coord(x), format_coord(y)));
        self
    }

    /// Add a line segment to the current path.
    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.push_ops(&format!("{} {} l\n", format_coord(x), format_coord(y)));
        self
    }

    /// Add a cubic Bezier segment with control points (x1, y1)
    /// and (x2, y2), ending at (x3, y3).
    pub fn curve_to(
        &mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x3: f64,
        y3: f64,
    ) -> &mut Self {
        self.push_ops(&format!(
            "{} {} {} {} {} {} c\n",
            format_coord(x1),
            format_coord(y1),
            format_coord(x2),
            format_coord(y2),
            format_coord(x3),
            format_coord(y3),
        ));
        self
    }

    /// Add a rectangle subpath.
    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.push_ops(&format!(
            "{} {} {} {} re\n",
            format_coord(x),
            format_coord(y),
            format_coord(width),
            format_coord(height),
        ));
        self
    }

    /// Close the current subpath.
    pub fn close_path(&mut self) -> &mut Self {
        self.push_ops("h\n");
        self
    }

    /// Stroke the current path.
    pub fn stroke(&mut self) -> &mut Self {
        self.push_ops("S\n");
        self
    }

    /// Fill the current path (nonzero winding rule).
    pub fn fill(&mut self) -> &mut Self {
        self.push_ops("f\n");
        self
    }

    /// Fill then stroke the current path.
    pub fn fill_stroke(&mut self) -> &mut Self {
        self.push_ops("B\n");
        self
    }

    /// Save the graphics state.
    pub fn save_state(&mut self) -> &mut Self {
        self.push_ops("q\n");
        self
    }

    /// Restore the graphics state.
    pub fn restore_state(&mut self) -> &mut Self {
        self.push_ops("Q\n");
        self
    }

    fn push_ops(&mut self, ops: &str) {
        let page = self
            .current_page
            .as_mut()
            .expect("graphics operation with no open page");
        page.content_ops.extend_from_slice(ops.as_bytes());
    }

    /// End the current page. Writes its content stream and queues
    /// the page dictionary for the page tree.
    pub fn end_page(&mut self) {
        let page = self
            .current_page
            .take()
            .expect("end_page called with no open page");

        let framed;
        let (content, filter): (&[u8], &str) = if self.compress_content {
            framed = deflate::frame(&page.content_ops);
            (&framed, "/Filter /FlateDecode\n")
        } else {
            (&page.content_ops, "")
        };

        let content_obj = self.writer.new_object();
        self.writer.append_str(&format!(
            "<<\n{}/Length {}\n>>\nstream\n",
            filter,
            content.len()
        ));
        self.writer.append(content);
        self.writer.append_str("\nendstream\n");
        self.writer.close_object();

        let font_objs = page
            .fonts_used
            .iter()
            .map(|id| self.fonts[id.0].resource.type0_obj)
            .collect();
        let image_objs = page
            .images_used
            .iter()
            .map(|id| self.images[id.0].xobject_obj)
            .collect();

        self.pages.push(PendingPage {
            width: page.width,
            height: page.height,
            content_obj,
            font_objs,
            image_objs,
        });
    }

    /// Finish the document. Writes the page dictionaries, pages
    /// tree, catalog, info dictionary, xref table, and trailer,
    /// then flushes everything to the underlying writer.
    /// Consumes self — no further operations are possible.
    pub fn end_document(mut self) -> io::Result<W> {
        // Auto-close any open page.
        if self.current_page.is_some() {
            self.end_page();
        }

        let info_obj = if self.info.is_empty() {
            None
        } else {
            let id = self.writer.new_object();
            let mut dict = String::from("<<\n");
            for (key, value) in &self.info {
                dict.push_str(&format!("/{} ({})\n", key, escape_pdf_string(value)));
            }
            dict.push_str(">>\n");
            self.writer.append_str(&dict);
            self.writer.close_object();
            Some(id)
        };

        // One page dictionary per pending page, then the pages tree.
        let pages_root = self.writer.current_highest_id() + self.pages.len() as u32 + 1;

        let mut kids = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let id = self.writer.new_object();
            let mut dict = format!(
                "<<\n/Type /Page\n/Parent {} 0 R\n/MediaBox [0 0 {} {}]\n/Contents {} 0 R\n",
                pages_root,
                format_coord(page.width),
                format_coord(page.height),
                page.content_obj,
            );
            dict.push_str("/Resources <<");
            if !page.font_objs.is_empty() {
                dict.push_str(" /Font <<");
                for obj in &page.font_objs {
                    dict.push_str(&format!(" /F{} {} 0 R", obj, obj));
                }
                dict.push_str(" >>");
            }
            if !page.image_objs.is_empty() {
                dict.push_str(" /XObject <<");
                for obj in &page.image_objs {
                    dict.push_str(&format!(" /Im{} {} 0 R", obj, obj));
                }
                dict.push_str(" >>");
            }
            dict.push_str(" >>\n>>\n");
            self.writer.append_str(&dict);
            self.writer.close_object();
            kids.push(id);
        }

        let pages_id = self.writer.new_object();
        debug_assert_eq!(pages_id, pages_root);
        let kid_refs: Vec<String> =
            kids.iter().map(|id| format!("{} 0 R", id)).collect();
        self.writer.append_str(&format!(
            "<<\n/Type /Pages\n/Kids [{}]\n/Count {}\n>>\n",
            kid_refs.join(" "),
            kids.len(),
        ));
        self.writer.close_object();

        let catalog_id = self.writer.new_object();
        self.writer
            .append_str(&format!("<<\n/Type /Catalog\n/Pages {} 0 R\n>>\n", pages_id));
        self.writer.close_object();

        let bytes = self.writer.finish(catalog_id, info_obj);
        self.out.write_all(&bytes)?;
        self.out.flush()?;
        Ok(self.out)
    }

    /// Fonts registered so far, in embedding order.
    pub fn font_registry(&self) -> &FontRegistry {
        &self.registry
    }
}

/// Format a coordinate value for PDF content streams.
pub(crate) fn format_coord(v: f64) -> String {
    if v == v.floor() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        let s = format!("{:.4}", v);
        let s = s.trim_end_matches('0');
        let s = s.trim_end_matches('.');
        s.to_string()
    }
}
