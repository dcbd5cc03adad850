//! Atomic commit-message file write.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::message::CommitMessage;

/// Write the rendered message to the destination in one atomic step.
///
/// The temp file lives in the destination's directory so the final
/// `persist` is a same-filesystem rename; an interrupted hook can never
/// leave a half-written commit message behind.
pub fn write_message(path: &Path, message: &CommitMessage) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;

    tmp.write_all(message.render().as_bytes())?;
    tmp.write_all(b"\n")?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
