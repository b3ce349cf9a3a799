use std::fs::OpenOptions;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to append row: {0}")]
    Write(#[from] csv::Error),
}

/// Append one `ID,Difficulty,Level` row to the summary file, writing the
/// header only when the file does not exist yet. Re-runs append duplicate
/// rows; nothing dedups.
pub fn append_row(
    csv_path: &Path,
    id: i32,
    difficulty: &str,
    level: &str,
) -> Result<(), SummaryError> {
    let existed = csv_path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)
        .map_err(|source| SummaryError::Open {
            path: csv_path.display().to_string(),
            source,
        })?;

    let mut writer = csv::Writer::from_writer(file);
    if !existed {
        writer.write_record(["ID", "Difficulty", "Level"])?;
    }
    writer.write_record([id.to_string().as_str(), difficulty, level])?;
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn scratch_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("maidata_export_{}_{name}.csv", std::process::id()));
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn header_is_written_exactly_once() {
        let path = scratch_file("header");
        append_row(&path, 44, "MASTER", "13+").unwrap();
        append_row(&path, 44, "Re:MASTER", "14").unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec!["ID,Difficulty,Level", "44,MASTER,13+", "44,Re:MASTER,14"]
        );
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn existing_file_only_gains_rows() {
        let path = scratch_file("append");
        fs::write(&path, "ID,Difficulty,Level\n1,BASIC,3\n").unwrap();
        append_row(&path, 2, "EXPERT", "11").unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.ends_with("2,EXPERT,11\n"));
        assert_eq!(text.matches("ID,Difficulty").count(), 1);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn unwritable_path_reports_open_error() {
        let path = std::env::temp_dir().join("maidata_export_missing_dir/summary.csv");
        let err = append_row(&path, 1, "BASIC", "1").unwrap_err();
        assert!(matches!(err, SummaryError::Open { .. }));
    }
}
