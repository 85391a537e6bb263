use std::path::{Component, Path, PathBuf};

use glob::Pattern;

/// Lexically normalize a path: drop `.` segments and fold `..` into the
/// preceding segment. Symlinks are not resolved.
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Recursively collect regular files under `root`, sorted and cleaned.
///
/// Symlinked directories are not descended into; symlinks to files are kept.
/// When `include` is non-empty, only files whose path relative to `root`
/// matches one of the patterns are returned.
pub fn files(root: &Path, include: &[Pattern]) -> Vec<PathBuf> {
    let root = clean(root);
    let mut out = Vec::new();
    collect(&root, &root, include, &mut out);
    out.sort();
    out
}

fn collect(base: &Path, dir: &Path, include: &[Pattern], out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();
        if file_type.is_dir() {
            collect(base, &path, include, out);
        } else if (file_type.is_file() || (file_type.is_symlink() && path.is_file()))
            && let Ok(rel) = path.strip_prefix(base)
            && (include.is_empty() || include.iter().any(|p| p.matches_path(rel)))
        {
            out.push(clean(&path));
        }
    }
}
