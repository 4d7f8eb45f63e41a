use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The text of a script together with the path it was read from.
///
/// The origin path is what labels the compiled chunk, so every diagnostic
/// produced while compiling or running the script points back at the file
/// the user named. Constructed once per run and consumed by execution;
/// nothing is cached.
#[derive(Debug, Clone)]
pub struct ScriptSource {
    text: String,
    origin: PathBuf,
}

impl ScriptSource {
    /// Read the full contents of `path` as UTF-8 text.
    pub fn read(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        debug!("read {} bytes from {}", text.len(), path.display());
        Ok(Self {
            text,
            origin: path.to_path_buf(),
        })
    }

    /// Build a source from in-memory text, labeled with `origin`.
    pub fn from_string(text: impl Into<String>, origin: impl Into<PathBuf>) -> Self {
        Self {
            text: text.into(),
            origin: origin.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Chunk name attached at compile time. The `@` prefix tells the
    /// interpreter the name is a file path, so diagnostics render as
    /// `path:line: message` instead of quoting the source text.
    pub fn chunk_name(&self) -> String {
        format!("@{}", self.origin.display())
    }
}
