//! Staging-path validation.
//!
//! Job payloads carry staged file paths relative to the staging root.
//! Producers validate them before enqueue and the upload worker
//! re-validates before reading, so a crafted payload can never escape
//! the staging directory.

use std::path::{Component, Path, PathBuf};

use paperjet_core::error::AppError;
use paperjet_core::result::AppResult;

/// Resolve a staged path against the staging root, rejecting traversal.
///
/// The path must be relative and may not contain `..` components; the
/// result is always inside `staging_root`.
pub fn resolve_staged_path(staging_root: &Path, staged_path: &str) -> AppResult<PathBuf> {
    let relative = Path::new(staged_path);

    if relative.is_absolute() {
        return Err(AppError::validation(format!(
            "Staged path must be relative: {staged_path}"
        )));
    }

    let mut resolved = staging_root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => {
                return Err(AppError::validation(format!(
                    "Staged path escapes the staging directory: {staged_path}"
                )));
            }
        }
    }

    if resolved == staging_root {
        return Err(AppError::validation("Staged path is empty"));
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_relative_paths() {
        let root = Path::new("/srv/staging");
        let resolved = resolve_staged_path(root, "uploads/1700-report.pdf").unwrap();
        assert_eq!(resolved, PathBuf::from("/srv/staging/uploads/1700-report.pdf"));

        let resolved = resolve_staged_path(root, "./report.pdf").unwrap();
        assert_eq!(resolved, PathBuf::from("/srv/staging/report.pdf"));
    }

    #[test]
    fn test_rejects_traversal() {
        let root = Path::new("/srv/staging");
        assert!(resolve_staged_path(root, "../etc/passwd").is_err());
        assert!(resolve_staged_path(root, "uploads/../../etc/passwd").is_err());
        assert!(resolve_staged_path(root, "/etc/passwd").is_err());
    }

    #[test]
    fn test_rejects_empty() {
        let root = Path::new("/srv/staging");
        assert!(resolve_staged_path(root, "").is_err());
        assert!(resolve_staged_path(root, ".").is_err());
    }
}
