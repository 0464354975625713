// ============================================================
// Layer 2 — InspectUseCase
// ============================================================
// Reads a pattern file without validating it against a model
// and reports label coverage and composition statistics, so
// out-of-range labels show up as warnings instead of a failed
// training run.

use anyhow::Result;

use crate::data::{loader::JsonlLoader, stats::DatasetSummary};
use crate::domain::{task::TaskCardinalities, traits::PatternSource};

pub struct InspectUseCase {
    loader: JsonlLoader,
    cards:  TaskCardinalities,
}

impl InspectUseCase {
    pub fn new(data: String) -> Self {
        Self { loader: JsonlLoader::new(data), cards: TaskCardinalities::reference() }
    }

    pub fn execute(&self) -> Result<DatasetSummary> {
        let records = self.loader.load_all()?;
        let summary = DatasetSummary::from_records(&records, &self.cards);
        for w in &summary.warnings {
            tracing::warn!("{}: {}", self.loader.path().display(), w);
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_inspect_reports_counts() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for spg in [225, 225, 14] {
            writeln!(
                file,
                r#"{{"intensity":[0.0,1.0],"spg":{spg},"crysystem":1,"blt":1,"symbols":["Si","O","O"]}}"#
            )
            .unwrap();
        }

        let summary = InspectUseCase::new(file.path().to_string_lossy().into_owned())
            .execute()
            .unwrap();
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.max_atoms, 3);
        assert!(summary.report().contains("Total samples analyzed: 3"));
    }

    #[test]
    fn test_inspect_missing_file() {
        assert!(InspectUseCase::new("no/such/file.jsonl".into()).execute().is_err());
    }
}
