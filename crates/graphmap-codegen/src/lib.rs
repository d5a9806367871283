//! Code writers: where generated source files end up.

mod output_stream;

pub use output_stream::OutputStreamCodeWriter;

use std::io::{self, Write};

/// Destination for generated source files.
pub trait CodeWriter {
    /// Open the sink for one generated file.
    fn open_binary(&mut self, package: &str, file_name: &str) -> io::Result<&mut dyn Write>;

    /// Flush and release the underlying sink(s).
    fn close(self) -> io::Result<()>
    where
        Self: Sized;
}

/// One generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub package: String,
    pub file_name: String,
    pub contents: String,
}

impl SourceFile {
    pub fn new(
        package: impl Into<String>,
        file_name: impl Into<String>,
        contents: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            file_name: file_name.into(),
            contents: contents.into(),
        }
    }
}

/// Write every file through `writer`, in order.
pub fn emit<W: CodeWriter>(writer: &mut W, files: &[SourceFile]) -> io::Result<()> {
    for file in files {
        let sink = writer.open_binary(&file.package, &file.file_name)?;
        sink.write_all(file.contents.as_bytes())?;
    }
    Ok(())
}
