use crate::document::format_coord;

/// RGB color for PDF graphics operations.
///
/// Each component is in the range 0.0 (none) to 1.0 (full intensity).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    /// Create a color from RGB components (each 0.0 to 1.0).
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Color { r, g, b }
    }

    /// Create a grayscale color (r = g = b = level).
    pub fn gray(level: f64) -> Self {
        Color {
            r: level,
            g: level,
            b: level,
        }
    }

    /// `RG` operator line selecting this color for strokes.
    pub(crate) fn stroke_op(&self) -> String {
        format!(
            "{} {} {} RG\n",
            format_coord(self.r),
            format_coord(self.g),
            format_coord(self.b)
        )
    }

    /// `rg` operator line selecting this color for fills.
    pub(crate) fn fill_op(&self) -> String {
        format!(
            "{} {} {} rg\n",
            format_coord(self.r),
            format_coord(self.g),
            format_coord(self.b)
        )
    }
}
