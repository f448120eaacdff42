//! Report output paths

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use std::path::Path;

/// Build the report filename for a run, e.g.
/// `weekly-report_2025-09-09_to_2025-10-09.md`.
pub fn report_filename(kind: &str, start: NaiveDate, end: NaiveDate) -> String {
    format!("{}-report_{}_to_{}.md", kind, start, end)
}

/// Make sure the output directory exists and is usable.
///
/// Creates it when missing; errors when the path exists but is not a
/// directory or cannot be created.
pub fn validate_output_directory(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            return Err(anyhow!(
                "output path exists but is not a directory: {}",
                path.display()
            ));
        }
        return Ok(());
    }

    std::fs::create_dir_all(path)
        .with_context(|| format!("failed to create output directory: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_report_filename() {
        assert_eq!(
            report_filename("weekly", date(2025, 9, 9), date(2025, 10, 9)),
            "weekly-report_2025-09-09_to_2025-10-09.md"
        );
    }

    #[test]
    fn test_validate_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("reports").join("nested");

        validate_output_directory(&target).unwrap();
        assert!(target.is_dir());
    }

    #[test]
    fn test_validate_rejects_file_path() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("report.md");
        std::fs::write(&file, "x").unwrap();

        assert!(validate_output_directory(&file).is_err());
    }
}
