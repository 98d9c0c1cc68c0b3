use std::path::{Path, PathBuf};

/// Expands a configured path, replacing a leading `~` or `$HOME` with the
/// user's home directory. Relative paths stay relative to the working directory.
pub fn expand_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(expand_home(s)),
        None => path.to_path_buf(),
    }
}

/// Returns the name a backup entry for `source` starts with.
///
/// Falls back to the canonical path when `source` has no final component
/// (`.` or `..`). Returns `None` for the filesystem root.
pub fn base_name(source: &Path) -> Option<String> {
    if let Some(name) = source.file_name() {
        return Some(name.to_string_lossy().into_owned());
    }
    let canonical = source.canonicalize().ok()?;
    canonical
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

fn expand_home(input: &str) -> String {
    let rest = ["~", "$HOME"].into_iter().find_map(|prefix| {
        input
            .strip_prefix(prefix)
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
    });
    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) => format!("{}{rest}", home.to_string_lossy()),
        _ => input.into(),
    }
}
