//! Shared error utilities

use miette::NamedSource;
use std::path::Path;

/// Toggle this to add spaces for iTerm2 clickability
const ADD_SPACES_FOR_ITERM: bool = true;

/// Format a file path for error display, relative to the working directory
/// when it lies below it
pub fn format_error_path(path: &Path) -> String {
    let display_path = std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf());
    let path_str = display_path.display().to_string();

    if ADD_SPACES_FOR_ITERM {
        format!(" {path_str}")
    } else {
        path_str
    }
}

/// Create a NamedSource with proper formatting for error display
pub fn create_named_source(path: &Path, content: String) -> NamedSource<String> {
    NamedSource::new(format_error_path(path), content)
}
