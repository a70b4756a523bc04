use pdf_compose::{Color, PdfDocument};

fn main() {
    std::fs::create_dir_all("demos/output").unwrap();
    let path = "demos/output/rust-graphics.pdf";
    let mut doc = PdfDocument::create(path).unwrap();
    doc.set_info("Creator", "pdf-compose");
    doc.set_info("Title", "Line Graphics Demo");
    doc.begin_page(612.0, 792.0);

    // Stroked rectangle (page border)
    doc.set_stroke_color(Color::rgb(0.0, 0.0, 0.0));
    doc.set_line_width(1.0);
    doc.rect(72.0, 72.0, 468.0, 648.0);
    doc.stroke();

    // Filled rectangle (light gray background box)
    doc.set_fill_color(Color::gray(0.9));
    doc.rect(100.0, 600.0, 200.0, 50.0);
    doc.fill();

    // Diagonal line
    doc.set_stroke_color(Color::rgb(0.0, 0.0, 1.0));
    doc.set_line_width(2.0);
    doc.move_to(100.0, 500.0);
    doc.line_to(300.0, 550.0);
    doc.stroke();

    // Triangle with fill and stroke
    doc.save_state();
    doc.set_fill_color(Color::rgb(1.0, 0.0, 0.0));
    doc.set_stroke_color(Color::rgb(0.0, 0.0, 0.0));
    doc.set_line_width(1.5);
    doc.move_to(350.0, 400.0)
        .line_to(450.0, 400.0)
        .line_to(400.0, 480.0)
        .close_path()
        .fill_stroke();
    doc.restore_state();

    // Nested rectangles using save/restore to isolate state
    doc.save_state();
    doc.set_stroke_color(Color::rgb(0.0, 0.5, 0.0));
    doc.set_line_width(3.0);
    doc.rect(150.0, 200.0, 300.0, 150.0);
    doc.stroke();

    doc.set_fill_color(Color::rgb(0.8, 0.9, 0.8));
    doc.rect(180.0, 230.0, 240.0, 90.0);
    doc.fill();
    doc.restore_state();

    // Bezier wave
    doc.set_stroke_color(Color::rgb(0.5, 0.0, 0.5));
    doc.set_line_width(2.0);
    doc.move_to(100.0, 120.0)
        .curve_to(180.0, 180.0, 260.0, 60.0, 340.0, 120.0)
        .curve_to(420.0, 180.0, 500.0, 60.0, 540.0, 120.0)
        .stroke();

    doc.end_page();
    doc.end_document().unwrap();
    println!("Generated: {}", path);
}
