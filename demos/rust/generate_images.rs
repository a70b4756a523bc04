use std::io::Write;

use pdf_compose::{Color, ImageFit, PdfDocument, Rect};

fn encode_png(width: u32, height: u32, color: png::ColorType, pixels: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(color);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(pixels).unwrap();
    }
    out
}

/// RGB gradient swatch.
fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.push((x * 255 / width) as u8);
            pixels.push((y * 255 / height) as u8);
            pixels.push(160);
        }
    }
    encode_png(width, height, png::ColorType::Rgb, &pixels)
}

/// RGBA disc with transparent corners.
fn disc_png(size: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    let center = (size / 2) as i64;
    let radius = center - 2;
    for y in 0..size as i64 {
        for x in 0..size as i64 {
            let dx = x - center;
            let dy = y - center;
            let inside = dx * dx + dy * dy <= radius * radius;
            pixels.extend_from_slice(&[200, 60, 40]);
            pixels.push(if inside { 255 } else { 0 });
        }
    }
    encode_png(size, size, png::ColorType::Rgba, &pixels)
}

/// Outline an image rect. Image rects hang from the page top;
/// path coordinates use PDF's bottom-left origin.
fn frame<W: Write>(doc: &mut PdfDocument<W>, rect: &Rect, page_height: f64) {
    doc.set_stroke_color(Color::gray(0.6))
        .set_line_width(0.5)
        .rect(
            rect.x,
            page_height - (rect.y + rect.height),
            rect.width,
            rect.height,
        )
        .stroke();
}

fn main() {
    std::fs::create_dir_all("demos/output").unwrap();
    let path = "demos/output/rust-images.pdf";
    let mut doc = PdfDocument::create(path).unwrap();
    doc.set_compression(true);
    doc.set_info("Creator", "pdf-compose");
    doc.set_info("Title", "Image Support Demo");

    let gradient = doc.load_image_bytes(gradient_png(160, 120)).unwrap();
    let disc = doc.load_image_bytes(disc_png(96)).unwrap();

    doc.begin_page(612.0, 792.0);

    // Fit mode — scales to fit, preserves aspect ratio
    let r1 = Rect {
        x: 72.0,
        y: 100.0,
        width: 200.0,
        height: 150.0,
    };
    frame(&mut doc, &r1, 792.0);
    doc.place_image(&gradient, &r1, ImageFit::Fit);

    // Stretch mode — fills rect exactly, may distort
    let r2 = Rect {
        x: 320.0,
        y: 100.0,
        width: 200.0,
        height: 150.0,
    };
    frame(&mut doc, &r2, 792.0);
    doc.place_image(&gradient, &r2, ImageFit::Stretch);

    // Fill mode — scales to cover, clips overflow
    let r3 = Rect {
        x: 72.0,
        y: 320.0,
        width: 200.0,
        height: 150.0,
    };
    frame(&mut doc, &r3, 792.0);
    doc.place_image(&disc, &r3, ImageFit::Fill);

    // None mode — natural size (1px = 1pt)
    let r4 = Rect {
        x: 320.0,
        y: 320.0,
        width: 200.0,
        height: 150.0,
    };
    frame(&mut doc, &r4, 792.0);
    doc.place_image(&disc, &r4, ImageFit::None);

    // Same images on a second page (demonstrates write-once)
    doc.begin_page(612.0, 792.0);
    let r5 = Rect {
        x: 72.0,
        y: 100.0,
        width: 468.0,
        height: 600.0,
    };
    frame(&mut doc, &r5, 792.0);
    doc.place_image(&gradient, &r5, ImageFit::Fit);

    doc.end_page();
    doc.end_document().unwrap();
    println!("Generated: {}", path);
}
