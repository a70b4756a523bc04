pub mod checksum;
pub mod deflate;
pub mod font;
pub mod cache;
pub mod embed;
pub mod writer;
pub mod graphics;
pub mod images;
pub mod textflow;
pub mod document;

pub use document::PdfDocument;
pub use embed::{DedupKey, FontRegistry, FontResource};
pub use font::{FontError, FontId, FontProgram};
pub use graphics::Color;
pub use images::{ImageFit, ImageId};
pub use textflow::{TextFlow, TextStyle, FitResult, Rect};
pub use writer::{ObjectWriter, PdfWriter};
