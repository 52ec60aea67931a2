//! XML output module
//!
//! Serializes transformed records into the feed document: one RECORD element
//! per record, in arrival order, wrapped once in a DATA root.

mod builder;
mod writer;

pub use builder::{escape_text, sanitize_element_name, XmlBuilder, XmlOptions};
pub use writer::{BufferWriter, OutputWriter};
