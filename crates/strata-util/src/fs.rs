use std::path::{Path, PathBuf};

/// Walk up from `start` looking for a directory named `dirname`.
/// Returns the path to that directory, or `None`.
pub fn find_ancestor_dir(start: &Path, dirname: &str) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join(dirname);
        if candidate.is_dir() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

/// List all `.toml` files directly under `dir`, sorted by file name.
pub fn list_toml_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "toml") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
