use walkdir::{WalkDir, DirEntry};
use std::path::{Path, PathBuf};
use anyhow::Result;

/// Every regular file under `root`, skipping hidden files and directories.
/// A plain file path is returned as-is.
pub fn scan_directory(root: &Path) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(root).sort_by_file_name().into_iter();

    let mut files = Vec::new();
    for entry in walker.filter_entry(|e| e.depth() == 0 || !is_hidden(e)) {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name()
         .to_str()
         .map(|s| s.starts_with('.'))
         .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scan_skips_hidden_entries() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir(dir.path().join("nature"))?;
        fs::create_dir(dir.path().join(".cache"))?;
        fs::write(dir.path().join("nature/forest.png"), b"forest")?;
        fs::write(dir.path().join("city.jpg"), b"city")?;
        fs::write(dir.path().join(".thumbs"), b"x")?;
        fs::write(dir.path().join(".cache/tmp.jpg"), b"x")?;

        let files = scan_directory(dir.path())?;
        assert_eq!(
            files,
            vec![dir.path().join("city.jpg"), dir.path().join("nature/forest.png")]
        );
        Ok(())
    }
}
