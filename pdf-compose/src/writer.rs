//! Low-level PDF file writer.
//!
//! [`PdfWriter`] accumulates the whole file in memory: each object's
//! byte offset is recorded as the object starts, and [`PdfWriter::finish`]
//! appends the xref table and trailer. Object content goes through the
//! [`ObjectWriter`] capability, which the font embedder also accepts,
//! so tests can drive it with a recording fake.

/// Capability for emitting numbered PDF objects.
pub trait ObjectWriter {
    /// Allocate the next object number and start its `N 0 obj` header.
    fn new_object(&mut self) -> u32;

    /// Append bytes to the object being written.
    fn append(&mut self, bytes: &[u8]);

    /// Terminate the object being written with `endobj`.
    fn close_object(&mut self);

    /// Highest object number allocated so far; 0 before the first.
    fn current_highest_id(&self) -> u32;

    /// Emit a metadata stream object for `text`, if this writer
    /// supports metadata. Must be called between objects, never while
    /// one is open.
    fn add_metadata_object(&mut self, _text: &str) -> Option<u32> {
        None
    }

    /// Append UTF-8 text to the object being written.
    fn append_str(&mut self, text: &str) {
        self.append(text.as_bytes());
    }
}

/// Buffered writer producing a complete PDF file.
pub struct PdfWriter {
    buf: Vec<u8>,
    /// Byte offset of each object header, indexed by object number - 1.
    offsets: Vec<usize>,
}

impl PdfWriter {
    /// Start a new file: PDF header plus the binary marker comment.
    pub fn new() -> Self {
        let mut buf = Vec::with_capacity(16 * 1024);
        buf.extend_from_slice(b"%PDF-1.7\n");
        // Four bytes >= 128 so transfer tools treat the file as binary.
        buf.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
        PdfWriter {
            buf,
            offsets: Vec::new(),
        }
    }

    /// Append the xref table, trailer, and EOF marker, returning the
    /// finished file bytes.
    pub fn finish(mut self, root_obj: u32, info_obj: Option<u32>) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let size = self.offsets.len() + 1;
        self.buf
            .extend_from_slice(format!("xref\n0 {}\n", size).as_bytes());
        // Entries are exactly 20 bytes; object 0 heads the free list.
        self.buf.extend_from_slice(b"0000000000 65535 f\r\n");
        for &offset in &self.offsets {
            self.buf
                .extend_from_slice(format!("{:010} 00000 n\r\n", offset).as_bytes());
        }
        self.buf.extend_from_slice(
            format!("trailer\n<< /Size {} /Root {} 0 R", size, root_obj).as_bytes(),
        );
        if let Some(info) = info_obj {
            self.buf
                .extend_from_slice(format!(" /Info {} 0 R", info).as_bytes());
        }
        self.buf.extend_from_slice(b" >>\n");
        self.buf
            .extend_from_slice(format!("startxref\n{}\n%%EOF\n", xref_offset).as_bytes());
        self.buf
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectWriter for PdfWriter {
    fn new_object(&mut self) -> u32 {
        self.offsets.push(self.buf.len());
        let number = self.offsets.len() as u32;
        self.buf
            .extend_from_slice(format!("{} 0 obj\n", number).as_bytes());
        number
    }

    fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn close_object(&mut self) {
        self.buf.extend_from_slice(b"endobj\n");
    }

    fn current_highest_id(&self) -> u32 {
        self.offsets.len() as u32
    }

    fn add_metadata_object(&mut self, text: &str) -> Option<u32> {
        let packet = xmp_packet(text);
        let id = self.new_object();
        self.append_str(&format!(
            "<<\n/Type /Metadata\n/Subtype /XML\n/Length {}\n>>\nstream\n",
            packet.len()
        ));
        self.append(packet.as_bytes());
        self.append_str("\nendstream\n");
        self.close_object();
        Some(id)
    }
}

/// Escape a string for a PDF literal string context.
pub fn escape_pdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out
}

/// XMP packet carrying `text` as rights usage terms.
fn xmp_packet(text: &str) -> String {
    let mut xml = String::with_capacity(text.len() + 512);
    xml.push_str("<?xpacket begin=\"\u{FEFF}\" id=\"W5M0MpCehiHzreSzNTczkc9d\"?>\n");
    xml.push_str("<x:xmpmeta xmlns:x=\"adobe:ns:meta/\">\n");
    xml.push_str("<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\">\n");
    xml.push_str(
        "<rdf:Description rdf:about=\"\" \
         xmlns:xmpRights=\"http://ns.adobe.com/xap/1.0/rights/\">\n",
    );
    xml.push_str("<xmpRights:UsageTerms>\n<rdf:Alt>\n<rdf:li xml:lang=\"x-default\">\n");
    xml.push_str(&escape_xml(text));
    xml.push_str("\n</rdf:li>\n</rdf:Alt>\n</xmpRights:UsageTerms>\n");
    xml.push_str("</rdf:Description>\n</rdf:RDF>\n</x:xmpmeta>\n<?xpacket end=\"w\"?>");
    xml
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
