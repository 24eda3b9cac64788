//! CLI command handlers.
//!
//! Handler functions own user-facing output and exit-code policy,
//! keeping main.rs a thin dispatcher.

mod scan;
mod scanners;

pub use scan::handle_scan;
pub use scanners::handle_scanners;

use crate::catalog::Catalog;
use crate::error::Result;
use std::path::Path;

/// Exit code for invalid invocations (bad options, unknown scanners).
pub const EXIT_USAGE: u8 = 1;
/// Exit code for scans aborted by an orchestration or unexpected error.
pub const EXIT_ABORTED: u8 = 16;

pub(crate) fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(path) => Catalog::from_file(path),
        None => Ok(Catalog::builtin()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_catalog_builtin_by_default() {
        let catalog = load_catalog(None).unwrap();
        assert!(!catalog.scanners.is_empty());
    }

    #[test]
    fn test_load_catalog_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.toml");
        fs::write(
            &path,
            "[[scanners]]\nname = \"x\"\ntitle = \"X\"\ncmd = \"x {target} {output}\"\n",
        )
        .unwrap();
        let catalog = load_catalog(Some(&path)).unwrap();
        assert_eq!(catalog.scanners.len(), 1);
        assert_eq!(catalog.scanners[0].name, "x");
    }

    #[test]
    fn test_load_catalog_missing_file_fails() {
        assert!(load_catalog(Some(Path::new("/nonexistent/catalog.toml"))).is_err());
    }
}
