//! File lookup against the resolved permitted directories.

use std::path::{Component, Path, PathBuf};

/// Search the permitted directories, in order, for a relative file path.
/// Returns the first existing regular file match.
///
/// The contract is strict: no reordering, no fuzzy matching, and no way to
/// escape the permitted set. Absolute paths and paths containing `..` are
/// rejected outright.
pub fn find_in_roots(relative: &str, roots: &[PathBuf]) -> Option<PathBuf> {
    let relative = Path::new(relative);
    if relative.is_absolute()
        || relative
            .components()
            .any(|c| matches!(c, Component::ParentDir))
    {
        return None;
    }

    for root in roots {
        let candidate = root.join(relative);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, "x\n").unwrap();
        path
    }

    #[test]
    fn first_directory_wins_when_both_match() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let in_a = touch(&a, "sales.csv");
        touch(&b, "sales.csv");

        let roots = vec![a.path().to_path_buf(), b.path().to_path_buf()];
        assert_eq!(find_in_roots("sales.csv", &roots), Some(in_a));
    }

    #[test]
    fn later_directories_are_searched_in_order() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let in_b = touch(&b, "only_in_b.csv");

        let roots = vec![a.path().to_path_buf(), b.path().to_path_buf()];
        assert_eq!(find_in_roots("only_in_b.csv", &roots), Some(in_b));
    }

    #[test]
    fn missing_file_is_not_found() {
        let a = TempDir::new().unwrap();
        let roots = vec![a.path().to_path_buf()];
        assert_eq!(find_in_roots("absent.csv", &roots), None);
    }

    #[test]
    fn directories_do_not_match() {
        let a = TempDir::new().unwrap();
        std::fs::create_dir(a.path().join("subdir")).unwrap();
        let roots = vec![a.path().to_path_buf()];
        assert_eq!(find_in_roots("subdir", &roots), None);
    }

    #[test]
    fn escaping_paths_are_rejected() {
        let a = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        touch(&outside, "secret.csv");

        let roots = vec![a.path().join("inner")];
        std::fs::create_dir(a.path().join("inner")).unwrap();

        assert_eq!(find_in_roots("../secret.csv", &roots), None);
        assert_eq!(
            find_in_roots(outside.path().join("secret.csv").to_str().unwrap(), &roots),
            None
        );
    }

    #[test]
    fn nested_relative_paths_are_allowed() {
        let a = TempDir::new().unwrap();
        std::fs::create_dir(a.path().join("monthly")).unwrap();
        let path = a.path().join("monthly/jan.csv");
        std::fs::write(&path, "x\n").unwrap();

        let roots = vec![a.path().to_path_buf()];
        assert_eq!(find_in_roots("monthly/jan.csv", &roots), Some(path));
    }
}
