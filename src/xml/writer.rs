//! Output writers
//!
//! A writer receives serialized record fragments as pages arrive and
//! produces the final document once the run finishes. The buffer writer is
//! the only production sink: hosts expect the whole document back in memory.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};

use crate::error::Result;

use super::builder::XmlBuilder;

/// Sink for serialized record fragments
#[async_trait]
pub trait OutputWriter: Send {
    /// Append one serialized record fragment
    async fn write_fragment(&mut self, fragment: &str) -> Result<()>;

    /// Number of fragments written so far
    fn fragments_written(&self) -> u64;

    /// Close the document and hand back the full payload
    async fn finalize(self: Box<Self>) -> Result<Bytes>;
}

/// Accumulates the document in memory.
///
/// The root open tag is written on construction, so a run with zero records
/// still finalizes to a well-formed empty document.
#[derive(Debug)]
pub struct BufferWriter {
    builder: XmlBuilder,
    buf: BytesMut,
    fragments: u64,
}

impl BufferWriter {
    /// Create a writer and open the document
    pub fn new(builder: XmlBuilder) -> Self {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(builder.document_open().as_bytes());
        Self {
            builder,
            buf,
            fragments: 0,
        }
    }

    /// Bytes buffered so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when nothing beyond the document opening has been written
    pub fn is_empty(&self) -> bool {
        self.fragments == 0
    }
}

impl Default for BufferWriter {
    fn default() -> Self {
        Self::new(XmlBuilder::default())
    }
}

#[async_trait]
impl OutputWriter for BufferWriter {
    async fn write_fragment(&mut self, fragment: &str) -> Result<()> {
        self.buf.extend_from_slice(fragment.as_bytes());
        self.fragments += 1;
        Ok(())
    }

    fn fragments_written(&self) -> u64 {
        self.fragments
    }

    async fn finalize(mut self: Box<Self>) -> Result<Bytes> {
        self.buf
            .extend_from_slice(self.builder.document_close().as_bytes());
        Ok(self.buf.freeze())
    }
}
