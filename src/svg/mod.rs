//! SVG document model and the text-to-path reconciler.
//!
//! # Modules
//!
//! - [`dom`]: Arena DOM with `quick-xml` parsing and serialization
//! - [`style`]: Inline `style` edits for the overlay text
//! - [`convert`]: Sanitize/export passes and the text/path merge
//!
//! # Architecture
//!
//! ```text
//!   input ──► sanitize ──► working copy ──┬──────────► merge ──► sanitize ──► output
//!                                         │              ▲
//!                                         └─► export ────┘
//!                                            (text → path)
//! ```

pub mod convert;
pub mod dom;
pub mod style;


pub use convert::{
    ConvertError, ConvertOptions, MergeReport, Pass, Skipped, convert, convert_with_report, merge,
};
pub use dom::{Document, NodeId, ParseError, SVG_NS};
