//! CodeWriter over a single byte sink.

use crate::CodeWriter;
use std::io::{self, Write};

/// Sends every generated file into the same sink, regardless of package or
/// file name. Closing flushes the sink and drops it.
pub struct OutputStreamCodeWriter<W: Write> {
    sink: W,
}

impl<W: Write> OutputStreamCodeWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Give the sink back without closing it.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write> CodeWriter for OutputStreamCodeWriter<W> {
    fn open_binary(&mut self, package: &str, file_name: &str) -> io::Result<&mut dyn Write> {
        tracing::debug!(package, file_name, "opening generated source");
        Ok(&mut self.sink)
    }

    fn close(mut self) -> io::Result<()> {
        self.sink.flush()
    }
}
