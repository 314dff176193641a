use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, instrument};

/// Opening marker; generated content lands immediately after it.
pub const START_MARKER: &str = "<!-- EXTERNAL_CONTRIBUTIONS:START -->";
/// Closing marker; the span back to the start marker is replaced.
pub const END_MARKER: &str = "<!-- EXTERNAL_CONTRIBUTIONS:END -->";

#[derive(Debug, Error)]
pub enum ReadmeError {
    #[error("Failed to read or write README: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not find markers in README")]
    MarkerNotFound,
}

/// Replace the span strictly between the two markers with a newline plus
/// `replacement`. Bytes outside the span are preserved untouched.
pub fn splice(content: &str, replacement: &str) -> Result<String, ReadmeError> {
    splice_between(content, START_MARKER, END_MARKER, replacement)
}

fn splice_between(
    content: &str,
    start_marker: &str,
    end_marker: &str,
    replacement: &str,
) -> Result<String, ReadmeError> {
    let start = content
        .find(start_marker)
        .ok_or(ReadmeError::MarkerNotFound)?;
    let inner = start + start_marker.len();
    // The end marker only counts when it follows the start marker.
    let end = content[inner..]
        .find(end_marker)
        .map(|offset| inner + offset)
        .ok_or(ReadmeError::MarkerNotFound)?;

    let mut patched = String::with_capacity(content.len() + replacement.len() + 1);
    patched.push_str(&content[..inner]);
    patched.push('\n');
    patched.push_str(replacement);
    patched.push_str(&content[end..]);
    Ok(patched)
}

/// Read the README, splice the rendered markdown between the markers, and
/// write the result back. The file is written once, and only when both
/// markers were found.
#[instrument(skip(markdown))]
pub fn update(path: &Path, markdown: &str) -> Result<(), ReadmeError> {
    let content = fs::read_to_string(path)?;
    let patched = splice(&content, markdown)?;
    fs::write(path, &patched)?;
    debug!(bytes = patched.len(), "README updated");
    Ok(())
}
