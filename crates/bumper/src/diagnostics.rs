//! Rendering of config errors with their source spans.
use codespan_reporting::{diagnostic::Diagnostic, files, term};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

/// Identifier of a source file registered with a [`Printer`].
pub type FileId = usize;
/// A byte-offset span in a source file.
pub type Span = std::ops::Range<usize>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to lookup file")]
    FileLookup(#[from] codespan_reporting::files::Error),
}

/// Convert an item into a sequence of diagnostics associated with a file.
pub trait ToDiagnostics {
    fn to_diagnostics<F: Copy + PartialEq>(&self, file_id: F) -> Vec<Diagnostic<F>>;
}

pub type BufferedPrinter = Printer<term::termcolor::Buffer>;

/// Tracks source files and emits formatted diagnostics to a writer.
pub struct Printer<W> {
    writer: Mutex<W>,
    diagnostic_config: term::Config,
    files: RwLock<files::SimpleFiles<String, String>>,
}

impl<W> std::fmt::Debug for Printer<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Printer").finish_non_exhaustive()
    }
}

/// Name under which a source file is shown in diagnostics.
pub trait ToSourceName {
    fn to_source_name(self) -> String;
}

impl ToSourceName for String {
    fn to_source_name(self) -> String {
        self
    }
}

impl ToSourceName for &Path {
    fn to_source_name(self) -> String {
        self.to_string_lossy().to_string()
    }
}

impl ToSourceName for &PathBuf {
    fn to_source_name(self) -> String {
        self.to_string_lossy().to_string()
    }
}

fn diagnostic_config() -> term::Config {
    term::Config {
        styles: term::Styles::with_blue(term::termcolor::Color::Blue),
        ..term::Config::default()
    }
}

impl Default for Printer<term::termcolor::StandardStream> {
    fn default() -> Self {
        Self::stderr(None)
    }
}

impl Default for Printer<term::termcolor::Buffer> {
    fn default() -> Self {
        Self::buffered()
    }
}

impl Printer<term::termcolor::Buffer> {
    #[must_use]
    pub fn buffered() -> Self {
        Self {
            writer: Mutex::new(term::termcolor::Buffer::ansi()),
            diagnostic_config: diagnostic_config(),
            files: RwLock::new(files::SimpleFiles::new()),
        }
    }

    /// Print written diagnostics to stderr.
    ///
    /// This is a workaround for <https://github.com/BurntSushi/termcolor/issues/51>.
    pub fn print(&self) -> Result<(), std::io::Error> {
        use std::io::Write;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.flush()?;
        eprintln!("{}", String::from_utf8_lossy(writer.as_slice()));
        Ok(())
    }
}

impl Printer<term::termcolor::StandardStream> {
    #[must_use]
    pub fn stderr(color_choice: Option<term::termcolor::ColorChoice>) -> Self {
        let color_choice = color_choice.unwrap_or(term::termcolor::ColorChoice::Auto);
        Self {
            writer: Mutex::new(term::termcolor::StandardStream::stderr(color_choice)),
            diagnostic_config: diagnostic_config(),
            files: RwLock::new(files::SimpleFiles::new()),
        }
    }
}

impl<W> Printer<W> {
    /// Zero-based line indices of the labels of `diagnostic`.
    pub fn lines(&self, diagnostic: &Diagnostic<FileId>) -> Result<Vec<usize>, files::Error> {
        use codespan_reporting::files::Files;
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        diagnostic
            .labels
            .iter()
            .map(|label| files.line_index(label.file_id, label.range.start))
            .collect()
    }

    pub fn add_source_file(&self, name: impl ToSourceName, source: String) -> FileId {
        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        files.add(name.to_source_name(), source)
    }
}

impl<W> Printer<W>
where
    W: term::termcolor::WriteColor,
{
    pub fn emit(&self, diagnostic: &Diagnostic<FileId>) -> Result<(), files::Error> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        term::emit(&mut *writer, &self.diagnostic_config, &*files, diagnostic)
    }
}
