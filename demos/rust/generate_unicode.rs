use pdf_compose::{Color, PdfDocument, TextStyle};

fn main() {
    // Use the system DejaVu Sans, or pass a font path as the
    // first argument.
    let font_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".to_string());

    std::fs::create_dir_all("demos/output").unwrap();
    let path = "demos/output/rust-unicode.pdf";
    let mut doc = PdfDocument::create(path).unwrap();
    doc.set_compression(true);
    doc.set_info("Creator", "pdf-compose");
    doc.set_info("Title", "Unicode Text Demo");

    let font = doc
        .load_font_file(&font_path)
        .expect("Failed to load font file");
    let heading = TextStyle::new(font, 18.0);
    let body = TextStyle::new(font, 12.0);

    doc.begin_page(612.0, 792.0);
    doc.place_text("Unicode Text Demo", 72.0, 720.0, &heading);

    // Underline the heading using its measured width.
    let width = doc.measure_text("Unicode Text Demo", &heading);
    doc.set_stroke_color(Color::BLACK)
        .set_line_width(0.75)
        .move_to(72.0, 714.0)
        .line_to(72.0 + width, 714.0)
        .stroke();

    let samples = [
        "English: The quick brown fox jumps over the lazy dog.",
        "Deutsch: Zwölf Boxkämpfer jagen Viktor quer über den Sylter Deich.",
        "Français: Portez ce vieux whisky au juge blond qui fume.",
        "Polski: Zażółć gęślą jaźń.",
        "Čeština: Příliš žluťoučký kůň úpěl ďábelské ódy.",
        "Ελληνικά: Ξεσκεπάζω την ψυχοφθόρα βδελυγμία.",
        "Русский: Съешь же ещё этих мягких французских булок.",
        "Math: ∀x ∈ ℝ: x² ≥ 0",
    ];

    let mut y = 680.0;
    for line in samples {
        doc.place_text(line, 72.0, y, &body);
        y -= 24.0;
    }

    doc.end_page();
    doc.end_document().unwrap();
    println!("Generated: {}", path);
}
