//! Pure text analysis over OCR output: redaction candidates and display titles.

pub mod sensitive;
pub mod title;

pub use sensitive::{detect_sensitive_ranges, SensitiveKind, SensitiveRange};
pub use title::derive_title;
