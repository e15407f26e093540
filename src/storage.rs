use crate::report::REPORT_FILE_NAME;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Where reports land when no directory is given: the user's downloads
/// folder, falling back to the working directory.
pub fn default_output_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Write report bytes to `dir/raman_analysis_report.json`, replacing any previous report.
pub fn save_report(dir: &Path, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(REPORT_FILE_NAME);
    export_json(&path, bytes)?;
    Ok(path)
}

pub fn export_json(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_report_uses_fixed_file_name_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out");
        let first = save_report(&nested, b"{\"a\": 1}").unwrap();
        assert_eq!(first.file_name().unwrap(), REPORT_FILE_NAME);

        let second = save_report(&nested, b"{\"a\": 2}").unwrap();
        assert_eq!(first, second);
        assert_eq!(std::fs::read_to_string(second).unwrap(), "{\"a\": 2}");
    }

    #[test]
    fn export_json_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/report.json");
        export_json(&path, b"{}").unwrap();
        assert!(path.exists());
    }
}
