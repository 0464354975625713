// ============================================================
// Layer 4 — Pattern Loader
// ============================================================
// Reads simulated XRD patterns from a JSON-lines file, one
// PatternRecord per line:
//
//   {"intensity":[...3501 values...],"spg":225,"crysystem":1,
//    "blt":3,"symbols":["Na","Cl"],"formula":"NaCl"}
//
// Blank lines are skipped. A malformed line aborts the load and
// the error carries its 1-based line number.
//
// Reference: serde_json documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::domain::pattern::PatternRecord;
use crate::domain::traits::PatternSource;
use crate::error::DataError;

pub struct JsonlLoader {
    path: PathBuf,
}

impl JsonlLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PatternSource for JsonlLoader {
    fn load_all(&self) -> Result<Vec<PatternRecord>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open dataset '{}'", self.path.display()))?;

        let records = parse_records(BufReader::new(file))
            .with_context(|| format!("Cannot parse dataset '{}'", self.path.display()))?;

        tracing::info!("Loaded {} patterns from '{}'", records.len(), self.path.display());
        Ok(records)
    }
}

/// Parse JSON-lines records from any buffered reader.
pub fn parse_records<R: BufRead>(reader: R) -> Result<Vec<PatternRecord>> {
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("I/O error reading line {}", i + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: PatternRecord = serde_json::from_str(&line).map_err(|e| DataError::Parse {
            line:   i + 1,
            reason: e.to_string(),
        })?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TWO_ROWS: &str = r#"{"intensity":[0.0,1.0,100.0],"spg":225,"crysystem":1,"blt":3,"symbols":["Na","Cl"],"formula":"NaCl"}

{"intensity":[2.0,3.0,4.0],"latt_dis":[1.0,2.0,3.0],"spg":14,"crysystem":6,"blt":2,"symbols":["Cs"],"mass":132.9}
"#;

    #[test]
    fn test_parse_skips_blank_lines() {
        let records = parse_records(Cursor::new(TWO_ROWS)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].spg, 225);
        assert_eq!(records[0].formula.as_deref(), Some("NaCl"));
        assert!(records[0].latt_dis.is_empty());
        assert_eq!(records[1].mass, Some(132.9));
        assert_eq!(records[1].display_formula(), "Cs");
    }

    #[test]
    fn test_malformed_line_reports_number() {
        let input = "{\"intensity\":[1.0],\"spg\":1,\"crysystem\":1,\"blt\":1,\"symbols\":[]}\n{oops}\n";
        let err = parse_records(Cursor::new(input)).unwrap_err();
        match err.downcast_ref::<DataError>() {
            Some(DataError::Parse { line, .. }) => assert_eq!(*line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.jsonl");
        std::fs::write(&path, TWO_ROWS).unwrap();

        let records = JsonlLoader::new(&path).load_all().unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(JsonlLoader::new("does/not/exist.jsonl").load_all().is_err());
    }
}
