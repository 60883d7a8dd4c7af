//! PDF assembly for compliance reports
//!
//! A `ReportDocument` becomes an A4 document with a title block, one
//! heading per section and an outline entry per heading.

pub mod assembler;
pub mod chart;
pub mod error;
pub mod inspect;
pub mod layout;
pub mod style;

pub use assembler::ReportAssembler;
pub use error::ReportError;
pub use inspect::{page_count, section_headings};
