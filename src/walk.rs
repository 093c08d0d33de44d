//! Directory discovery helpers shared by the scanner and the converters.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::DefectPrepError;

/// Recursively collects files under `root` whose extension is in `extensions`
/// (case-insensitive), sorted by their path relative to `root`.
///
/// Directory iteration order differs between platforms and filesystems; the
/// sort makes everything downstream (notably the seeded split) reproducible.
/// The first entry that cannot be read aborts with `Traversal`.
pub fn collect_files_with_extensions(
    root: &Path,
    extensions: &[String],
) -> Result<Vec<PathBuf>, DefectPrepError> {
    let (files, errors) = walk_files_with_extensions(root, extensions);
    match errors.into_iter().next() {
        Some(source) => Err(DefectPrepError::Traversal {
            path: source.path().unwrap_or(root).to_path_buf(),
            message: source.to_string(),
        }),
        None => Ok(files),
    }
}

/// Like [`collect_files_with_extensions`], but entries that cannot be read
/// (dangling symlinks, permission errors, link loops) are returned next to
/// the files instead of ending the walk.
pub fn walk_files_with_extensions(
    root: &Path,
    extensions: &[String],
) -> (Vec<PathBuf>, Vec<walkdir::Error>) {
    let mut files = Vec::new();
    let mut errors = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
                    files.push(entry.path().to_path_buf());
                }
            }
            Err(err) => errors.push(err),
        }
    }

    files.sort_by_cached_key(|path| rel_string(root, path));
    (files, errors)
}

/// Lists regular files directly inside `dir` whose file name ends with
/// `.{extension}` (exact, case-sensitive), sorted by file name.
pub fn list_files_with_suffix(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, DefectPrepError> {
    let suffix = format!(".{extension}");
    let mut files = Vec::new();

    for entry in fs::read_dir(dir).map_err(DefectPrepError::io_at(dir))? {
        let entry = entry.map_err(DefectPrepError::io_at(dir))?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.ends_with(&suffix))
            .unwrap_or(false);
        if matches && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

pub fn has_extension(path: &Path, allowed: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext.trim_start_matches('.')))
}

/// Path relative to `root` with forward slashes, for stable sorting and display.
pub fn rel_string(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let allowed = exts(&["jpg", ".png"]);
        assert!(has_extension(Path::new("a/B.JPG"), &allowed));
        assert!(has_extension(Path::new("a/b.png"), &allowed));
        assert!(!has_extension(Path::new("a/b.xml"), &allowed));
        assert!(!has_extension(Path::new("a/jpg"), &allowed));
    }

    #[test]
    fn collects_recursively_in_sorted_order() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let root = temp.path();
        fs::create_dir_all(root.join("b")).expect("mkdir");
        fs::create_dir_all(root.join("a/nested")).expect("mkdir");
        fs::write(root.join("b/z.jpg"), b"x").expect("write");
        fs::write(root.join("a/nested/y.JPG"), b"x").expect("write");
        fs::write(root.join("a/x.jpg"), b"x").expect("write");
        fs::write(root.join("a/x.xml"), b"x").expect("write");

        let files = collect_files_with_extensions(root, &exts(&["jpg"])).expect("collect");
        let rels: Vec<_> = files.iter().map(|p| rel_string(root, p)).collect();
        assert_eq!(rels, vec!["a/nested/y.JPG", "a/x.jpg", "b/z.jpg"]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_entries_are_returned_beside_the_files() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let root = temp.path();
        fs::write(root.join("good.jpg"), b"x").expect("write");
        std::os::unix::fs::symlink(root.join("gone.jpg"), root.join("dangling.jpg"))
            .expect("symlink");

        let (files, errors) = walk_files_with_extensions(root, &exts(&["jpg"]));
        assert_eq!(files, vec![root.join("good.jpg")]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path(), Some(root.join("dangling.jpg").as_path()));

        let err = collect_files_with_extensions(root, &exts(&["jpg"])).unwrap_err();
        assert!(matches!(err, DefectPrepError::Traversal { ref path, .. } if path.ends_with("dangling.jpg")));
    }

    #[test]
    fn suffix_listing_is_flat_and_case_sensitive() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let root = temp.path();
        fs::create_dir_all(root.join("sub")).expect("mkdir");
        fs::write(root.join("b.jpg"), b"x").expect("write");
        fs::write(root.join("a.jpg"), b"x").expect("write");
        fs::write(root.join("c.JPG"), b"x").expect("write");
        fs::write(root.join("sub/d.jpg"), b"x").expect("write");

        let files = list_files_with_suffix(root, "jpg").expect("list");
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
    }
}
