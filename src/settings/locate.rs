use crate::config::{SETTINGS_DIR, SETTINGS_FILE};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const EXCLUDED_DIRS: &[&str] = &["node_modules", "target", ".git"];

/// First `terminals.json` under `<root>/.termdeck`, walked in file-name
/// order for determinism. Zero matches is a normal `None`, never an error.
pub fn locate_settings_file(root: &Path) -> Option<PathBuf> {
    let base = root.join(SETTINGS_DIR);
    if !base.is_dir() {
        return None;
    }

    WalkDir::new(&base)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_excluded_dir(entry))
        .filter_map(Result::ok)
        .find(|entry| {
            entry.file_type().is_file() && entry.file_name().to_str() == Some(SETTINGS_FILE)
        })
        .map(|entry| entry.into_path())
}

fn is_excluded_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map_or(false, |name| EXCLUDED_DIRS.contains(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_settings_file_at_fixed_location() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join(SETTINGS_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(SETTINGS_FILE), "{}").unwrap();

        let found = locate_settings_file(root.path()).unwrap();
        assert_eq!(found, dir.join(SETTINGS_FILE));
    }

    #[test]
    fn finds_settings_file_in_nested_subdirectory() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join(SETTINGS_DIR).join("profiles");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join(SETTINGS_FILE), "{}").unwrap();

        let found = locate_settings_file(root.path()).unwrap();
        assert_eq!(found, nested.join(SETTINGS_FILE));
    }

    #[test]
    fn missing_settings_dir_is_not_an_error() {
        let root = tempfile::tempdir().unwrap();
        assert!(locate_settings_file(root.path()).is_none());
    }

    #[test]
    fn dependency_directories_are_skipped() {
        let root = tempfile::tempdir().unwrap();
        let vendored = root.path().join(SETTINGS_DIR).join("node_modules");
        fs::create_dir_all(&vendored).unwrap();
        fs::write(vendored.join(SETTINGS_FILE), "{}").unwrap();

        assert!(locate_settings_file(root.path()).is_none());
    }
}
