//! Metadata parsing for archive contents
//!
//! # Error Handling Strategy
//!
//! Embedded `info.json` files are third-party and frequently hand-edited, so this module
//! follows a **graceful degradation** approach:
//!
//! - **Structured first**: [`extractor::extract_structured`] parses the document strictly and
//!   reports failures as [`ExtractionError`] values, never panics.
//!
//! - **Pattern fallback**: [`extractor::extract_field`] and [`extractor::extract_raw_value`]
//!   scrape individual keys from raw text when the document is not valid JSON. They return
//!   `None` for anything they cannot find.
//!
//! - **Lenient records**: the serde helpers in [`deserializers`] accept the shapes older tools
//!   wrote (numeric or RFC3339 timestamps, any casing of category names).

pub mod deserializers;
pub mod extractor;

pub use extractor::{ExtractionError, extract_field, extract_raw_value, extract_structured};
