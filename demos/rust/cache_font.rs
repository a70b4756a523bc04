use pdf_compose::{cache, FontProgram, PdfDocument, TextStyle};

fn main() {
    let font_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".to_string());

    std::fs::create_dir_all("demos/output").unwrap();
    let cache_path = "demos/output/font.cache";

    // Parse the sfnt once and store the result.
    let program = FontProgram::load(&font_path).expect("Failed to load font file");
    println!(
        "Parsed {}: {} units/em, {} glyphs, {} program bytes",
        program.name,
        program.units_per_em,
        program.advance_width.len(),
        program.program_bytes.len(),
    );
    cache::store_file(cache_path, &program).unwrap();
    let size = std::fs::metadata(cache_path).unwrap().len();
    println!("Cached: {} ({} bytes)", cache_path, size);

    // Later runs decode the cache and skip sfnt parsing entirely.
    let path = "demos/output/rust-cached-font.pdf";
    let mut doc = PdfDocument::create(path).unwrap();
    doc.set_compression(true);
    doc.set_info("Creator", "pdf-compose");
    doc.set_info("Title", "Cached Font Demo");

    let font = doc.load_font_cached(cache_path).unwrap();
    let style = TextStyle::new(font, 14.0);

    doc.begin_page(612.0, 792.0);
    doc.place_text("This font came from the cache.", 72.0, 720.0, &style);
    doc.end_page();
    doc.end_document().unwrap();
    println!("Generated: {}", path);
}
