use pdf_compose::font::UNICODE_TABLE_LEN;
use pdf_compose::{FitResult, FontProgram, PdfDocument, Rect, TextFlow, TextStyle};

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .filter(|w| *w == needle)
        .count()
}

/// ASCII-mapped program: code points 0x20..0x7F at glyph cp - 0x1F.
/// Every advance is 500/1000 em, so each character is half the font
/// size wide and the line height equals the font size exactly.
fn flow_font(name: &str) -> FontProgram {
    let mut unicode_to_gid = vec![0u16; UNICODE_TABLE_LEN];
    for cp in 0x20..0x7F {
        unicode_to_gid[cp] = (cp - 0x1F) as u16;
    }
    FontProgram {
        name: name.to_string(),
        info: String::new(),
        units_per_em: 1000,
        bbox: [-50, -200, 1050, 900],
        ascent: 800,
        descent: -200,
        cap_height: 700,
        underline_position: -100,
        underline_thickness: 50,
        first_char: 0x20,
        last_char: 0x7E,
        advance_width: vec![500; 97],
        glyph_width: vec![450; 97],
        unicode_to_gid,
        is_cff: false,
        program_bytes: b"\x00\x01\x00\x00 sfnt payload".to_vec(),
    }
}

#[test]
fn simple_text_fits_in_one_box() {
    let mut doc = PdfDocument::new(Vec::new());
    let font = doc.add_font(flow_font("FlowTest")).unwrap();
    let style = TextStyle::new(font, 12.0);

    let mut flow = TextFlow::new();
    flow.add_text("Hello world", &style);

    doc.begin_page(612.0, 792.0);
    let rect = Rect {
        x: 72.0,
        y: 720.0,
        width: 468.0,
        height: 648.0,
    };
    let result = doc.fit_textflow(&mut flow, &rect);
    assert_eq!(result, FitResult::Stop);
    assert!(flow.is_finished());
    doc.end_page();
    let output = doc.end_document().unwrap();

    assert!(contains(&output, b"BT\n"));
    assert!(contains(&output, b"/F5 12 Tf\n"));
    // "Hello", then "world" with its separating space kept inline.
    assert!(contains(&output, b"<00290046004D004D0050> Tj\n"));
    assert!(contains(&output, b"<0001005800500053004D0045> Tj\n"));
    assert!(contains(&output, b"ET\n"));
}

#[test]
fn first_baseline_sits_one_ascent_below_the_top() {
    let mut doc = PdfDocument::new(Vec::new());
    let font = doc.add_font(flow_font("FlowTest")).unwrap();
    let style = TextStyle::new(font, 12.0);

    let mut flow = TextFlow::new();
    flow.add_text("Hello", &style);

    doc.begin_page(612.0, 792.0);
    let rect = Rect {
        x: 72.0,
        y: 720.0,
        width: 468.0,
        height: 100.0,
    };
    doc.fit_textflow(&mut flow, &rect);
    doc.end_page();
    let output = doc.end_document().unwrap();

    // 720 minus the scaled ascent 800/1000 * 12 = 9.6.
    assert!(contains(&output, b"72 710.4 Td\n"));
}

#[test]
fn box_shorter_than_one_line_is_empty() {
    let mut doc = PdfDocument::new(Vec::new());
    let font = doc.add_font(flow_font("FlowTest")).unwrap();
    let style = TextStyle::new(font, 12.0);

    let mut flow = TextFlow::new();
    flow.add_text("Hello", &style);

    doc.begin_page(612.0, 792.0);
    let rect = Rect {
        x: 72.0,
        y: 720.0,
        width: 468.0,
        height: 10.0,
    };
    let result = doc.fit_textflow(&mut flow, &rect);
    assert_eq!(result, FitResult::BoxEmpty);
    assert!(!flow.is_finished());
    doc.end_page();
    let output = doc.end_document().unwrap();

    assert!(!contains(&output, b"BT\n"));
}

#[test]
fn single_word_wider_than_box_is_empty() {
    let mut doc = PdfDocument::new(Vec::new());
    let font = doc.add_font(flow_font("FlowTest")).unwrap();
    let style = TextStyle::new(font, 12.0);

    let mut flow = TextFlow::new();
    // 20 characters at 6pt each: 120pt, far wider than the box.
    flow.add_text("Supercalifragilistic", &style);

    doc.begin_page(612.0, 792.0);
    let rect = Rect {
        x: 72.0,
        y: 720.0,
        width: 50.0,
        height: 100.0,
    };
    let result = doc.fit_textflow(&mut flow, &rect);
    assert_eq!(result, FitResult::BoxEmpty);
    assert!(!flow.is_finished());
}

#[test]
fn oversized_word_overflows_once_text_is_placed() {
    let mut doc = PdfDocument::new(Vec::new());
    let font = doc.add_font(flow_font("FlowTest")).unwrap();
    let style = TextStyle::new(font, 12.0);

    let mut flow = TextFlow::new();
    flow.add_text("Hi Supercalifragilistic", &style);

    doc.begin_page(612.0, 792.0);
    let rect = Rect {
        x: 72.0,
        y: 720.0,
        width: 50.0,
        height: 100.0,
    };
    let result = doc.fit_textflow(&mut flow, &rect);
    assert_eq!(result, FitResult::Stop);
    assert!(flow.is_finished());
}

#[test]
fn word_wrapping_respects_box_width() {
    let mut doc = PdfDocument::new(Vec::new());
    let font = doc.add_font(flow_font("FlowTest")).unwrap();
    let style = TextStyle::new(font, 12.0);

    let mut flow = TextFlow::new();
    flow.add_text("Hello world", &style);

    doc.begin_page(612.0, 792.0);
    // "Hello" is 30pt; adding " world" would need 66pt.
    let rect = Rect {
        x: 72.0,
        y: 720.0,
        width: 40.0,
        height: 100.0,
    };
    let result = doc.fit_textflow(&mut flow, &rect);
    assert_eq!(result, FitResult::Stop);
    doc.end_page();
    let output = doc.end_document().unwrap();

    assert_eq!(count(&output, b" Td\n"), 2);
    assert!(contains(&output, b"0 -12 Td\n"));
    assert!(contains(&output, b"<00290046004D004D0050> Tj\n"));
    // Wrapped word starts its line without the separating space.
    assert!(contains(&output, b"<005800500053004D0045> Tj\n"));
    assert!(!contains(&output, b"<0001005800500053004D0045>"));
}

#[test]
fn newline_forces_line_break() {
    let mut doc = PdfDocument::new(Vec::new());
    let font = doc.add_font(flow_font("FlowTest")).unwrap();
    let style = TextStyle::new(font, 12.0);

    let mut flow = TextFlow::new();
    flow.add_text("Line one\nLine two", &style);

    doc.begin_page(612.0, 792.0);
    let rect = Rect {
        x: 72.0,
        y: 720.0,
        width: 468.0,
        height: 100.0,
    };
    let result = doc.fit_textflow(&mut flow, &rect);
    assert_eq!(result, FitResult::Stop);
    doc.end_page();
    let output = doc.end_document().unwrap();

    assert_eq!(count(&output, b" Td\n"), 2);
    assert!(contains(&output, b"0 -12 Td\n"));
}

#[test]
fn space_preserved_between_added_spans() {
    let mut doc = PdfDocument::new(Vec::new());
    let font = doc.add_font(flow_font("FlowTest")).unwrap();
    let style = TextStyle::new(font, 12.0);

    let mut flow = TextFlow::new();
    flow.add_text("Apples", &style);
    flow.add_text(" and", &style);
    flow.add_text(" oranges", &style);

    doc.begin_page(612.0, 792.0);
    let rect = Rect {
        x: 72.0,
        y: 720.0,
        width: 468.0,
        height: 100.0,
    };
    doc.fit_textflow(&mut flow, &rect);
    doc.end_page();
    let output = doc.end_document().unwrap();

    // " and" keeps its leading space inside the hex run.
    assert!(contains(&output, b"<00010042004F0045> Tj\n"));
}

#[test]
fn empty_flow_returns_stop() {
    let mut doc = PdfDocument::new(Vec::new());

    let mut flow = TextFlow::new();
    assert!(flow.is_finished());

    doc.begin_page(612.0, 792.0);
    let rect = Rect {
        x: 72.0,
        y: 720.0,
        width: 468.0,
        height: 648.0,
    };
    let result = doc.fit_textflow(&mut flow, &rect);
    assert_eq!(result, FitResult::Stop);
    doc.end_page();
    let output = doc.end_document().unwrap();

    assert!(!contains(&output, b"BT\n"));
}

#[test]
fn mixed_fonts_switch_tf_inside_one_line() {
    let mut doc = PdfDocument::new(Vec::new());
    let alpha = doc.add_font(flow_font("AlphaTest")).unwrap();
    let beta = doc.add_font(flow_font("BetaTest")).unwrap();
    let style_a = TextStyle::new(alpha, 12.0);
    let style_b = TextStyle::new(beta, 12.0);

    let mut flow = TextFlow::new();
    flow.add_text("Alpha ", &style_a);
    flow.add_text("beta", &style_b);

    doc.begin_page(612.0, 792.0);
    let rect = Rect {
        x: 72.0,
        y: 720.0,
        width: 468.0,
        height: 100.0,
    };
    let result = doc.fit_textflow(&mut flow, &rect);
    assert_eq!(result, FitResult::Stop);
    doc.end_page();
    let output = doc.end_document().unwrap();

    assert!(contains(&output, b"/F5 12 Tf\n"));
    assert!(contains(&output, b"/F10 12 Tf\n"));
    // Both fonts land in the page resources.
    assert!(contains(&output, b"/F5 5 0 R"));
    assert!(contains(&output, b"/F10 10 0 R"));
}

#[test]
fn size_change_emits_new_tf() {
    let mut doc = PdfDocument::new(Vec::new());
    let font = doc.add_font(flow_font("FlowTest")).unwrap();
    let small = TextStyle::new(font, 12.0);
    let large = TextStyle::new(font, 18.0);

    let mut flow = TextFlow::new();
    flow.add_text("small ", &small);
    flow.add_text("LARGE", &large);

    doc.begin_page(612.0, 792.0);
    let rect = Rect {
        x: 72.0,
        y: 720.0,
        width: 468.0,
        height: 100.0,
    };
    doc.fit_textflow(&mut flow, &rect);
    doc.end_page();
    let output = doc.end_document().unwrap();

    assert!(contains(&output, b"/F5 12 Tf\n"));
    assert!(contains(&output, b"/F5 18 Tf\n"));
}

#[test]
fn full_box_resumes_in_the_next_box() {
    let mut doc = PdfDocument::new(Vec::new());
    let font = doc.add_font(flow_font("FlowTest")).unwrap();
    let style = TextStyle::new(font, 12.0);

    let mut flow = TextFlow::new();
    flow.add_text("first\nsecond", &style);

    doc.begin_page(612.0, 792.0);
    // Only one 12pt line fits in 15pt of height.
    let narrow = Rect {
        x: 72.0,
        y: 720.0,
        width: 468.0,
        height: 15.0,
    };
    let result = doc.fit_textflow(&mut flow, &narrow);
    assert_eq!(result, FitResult::BoxFull);
    assert!(!flow.is_finished());

    let lower = Rect {
        x: 72.0,
        y: 600.0,
        width: 468.0,
        height: 100.0,
    };
    let result = doc.fit_textflow(&mut flow, &lower);
    assert_eq!(result, FitResult::Stop);
    assert!(flow.is_finished());
    doc.end_page();
    let output = doc.end_document().unwrap();

    // The second box starts its own BT block at its own baseline.
    assert!(contains(&output, b"72 590.4 Td\n"));
    assert!(contains(&output, b"<0054004600440050004F0045> Tj\n"));
}

#[test]
fn long_text_flows_across_pages() {
    let mut doc = PdfDocument::new(Vec::new());
    let font = doc.add_font(flow_font("FlowTest")).unwrap();
    let style = TextStyle::new(font, 12.0);

    let mut flow = TextFlow::new();
    let text = "word ".repeat(200);
    flow.add_text(&text, &style);

    // 6 words per 200pt line, 4 lines per 50pt box: 24 words a page.
    let rect = Rect {
        x: 72.0,
        y: 720.0,
        width: 200.0,
        height: 50.0,
    };
    let mut pages = 0;
    loop {
        doc.begin_page(612.0, 792.0);
        let result = doc.fit_textflow(&mut flow, &rect);
        pages += 1;
        match result {
            FitResult::Stop => break,
            FitResult::BoxFull => continue,
            FitResult::BoxEmpty => panic!("box cannot hold a single line"),
        }
    }
    doc.end_page();
    assert_eq!(pages, 9);
    assert!(flow.is_finished());

    let output = doc.end_document().unwrap();
    assert!(contains(&output, b"/Count 9"));
}
