//! svgtxt2path - convert SVG text to paths with Inkscape, keeping the text
//! selectable as an invisible overlay.
//!
//! ```ignore
//! let svg = Document::parse(r#"<svg><text id="t1">Hi</text></svg>"#)?;
//! let converted = svg::convert(&svg, &ConvertOptions::default()).await?;
//! ```

pub mod cli;
pub mod config;
pub mod inkscape;
pub mod logger;
pub mod svg;
pub mod utils;

pub use svg::{ConvertError, ConvertOptions, Document, convert};
