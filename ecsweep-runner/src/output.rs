//! Aggregate output file.
//!
//! One text block per invocation: the command line on its own line, each
//! captured line, then a blank separator line. Blocks are written in
//! ascending command-line order so the same result always renders to the
//! same file.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::executor::RunResult;

/// Name of the aggregate file inside the output folder.
pub const OUTPUT_FILE_NAME: &str = "output.txt";

/// Errors writing sweep artifacts.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("illegal output folder {}: {source}", .path.display())]
    Folder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Write every block of `result` to `writer`.
pub fn render<W: Write>(result: &RunResult, mut writer: W) -> io::Result<()> {
    for (command, lines) in result {
        writeln!(writer, "{command}")?;
        for line in lines {
            writeln!(writer, "{line}")?;
        }
        writeln!(writer)?;
    }
    writer.flush()
}

/// [`render`] into a `String`.
pub fn render_to_string(result: &RunResult) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = render(result, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Create `folder` if needed. Shared by every artifact writer.
pub(crate) fn ensure_folder(folder: &Path) -> Result<(), OutputError> {
    fs::create_dir_all(folder).map_err(|source| OutputError::Folder {
        path: folder.to_path_buf(),
        source,
    })
}

/// Write `<folder>/output.txt`, replacing any previous file.
///
/// Returns the path written.
pub fn write_output(folder: &Path, result: &RunResult) -> Result<PathBuf, OutputError> {
    ensure_folder(folder)?;
    let path = folder.join(OUTPUT_FILE_NAME);

    let write = |path: &Path| -> io::Result<()> {
        let file = File::create(path)?;
        render(result, BufWriter::new(file))
    };
    write(&path).map_err(|source| OutputError::Write {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), entries = result.len(), "wrote sweep output");
    Ok(path)
}
