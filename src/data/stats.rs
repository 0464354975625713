// ============================================================
// Layer 4 — Dataset Statistics
// ============================================================
// Label coverage and composition statistics for one dataset,
// used by the `inspect` command to sanity-check a file before
// training on it.

use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap};

use crate::domain::elements::ELEMENTS;
use crate::domain::pattern::PatternRecord;
use crate::domain::task::{crystal_system_name, TaskCardinalities};

const LARGEST_KEPT: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub samples:            usize,
    pub spg_values:         BTreeSet<i64>,
    pub crysystem_values:   BTreeSet<i64>,
    pub blt_values:         BTreeSet<i64>,
    /// Fewest / most atoms in one composition
    pub min_atoms:          usize,
    pub max_atoms:          usize,
    /// Total atom count per element symbol, most common first
    pub element_totals:     Vec<(String, usize)>,
    /// (atoms, formula) for the largest compositions, largest first
    pub largest:            Vec<(usize, String)>,
    /// Percentage of samples per space group, most frequent first
    pub spg_frequencies:    Vec<(i64, f64)>,
    pub warnings:           Vec<String>,
}

impl DatasetSummary {
    pub fn from_records(records: &[PatternRecord], cards: &TaskCardinalities) -> Self {
        let mut spg_values       = BTreeSet::new();
        let mut crysystem_values = BTreeSet::new();
        let mut blt_values       = BTreeSet::new();
        let mut spg_counts: BTreeMap<i64, usize> = BTreeMap::new();
        let mut element_counts: HashMap<&str, usize> = HashMap::new();
        let mut min_atoms = usize::MAX;
        let mut max_atoms = 0;

        // Min-heap of the largest compositions seen so far
        let mut largest: BinaryHeap<Reverse<(usize, String)>> = BinaryHeap::new();

        for r in records {
            spg_values.insert(r.spg);
            crysystem_values.insert(r.crysystem);
            blt_values.insert(r.blt);
            *spg_counts.entry(r.spg).or_default() += 1;

            for s in &r.symbols {
                *element_counts.entry(s.as_str()).or_default() += 1;
            }

            let atoms = r.symbols.len();
            min_atoms = min_atoms.min(atoms);
            max_atoms = max_atoms.max(atoms);

            if largest.len() < LARGEST_KEPT {
                largest.push(Reverse((atoms, r.display_formula())));
            } else if largest.peek().is_some_and(|Reverse((n, _))| atoms > *n) {
                largest.pop();
                largest.push(Reverse((atoms, r.display_formula())));
            }
        }

        if records.is_empty() {
            min_atoms = 0;
        }

        let mut element_totals: Vec<(String, usize)> = element_counts
            .iter()
            .map(|(e, n)| (e.to_string(), *n))
            .collect();
        element_totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut largest: Vec<(usize, String)> = largest.into_iter().map(|Reverse(x)| x).collect();
        largest.sort_by(|a, b| b.cmp(a));

        let total = records.len().max(1) as f64;
        let mut spg_frequencies: Vec<(i64, f64)> = spg_counts
            .iter()
            .map(|(spg, n)| (*spg, *n as f64 * 100.0 / total))
            .collect();
        spg_frequencies.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut summary = Self {
            samples: records.len(),
            spg_values,
            crysystem_values,
            blt_values,
            min_atoms,
            max_atoms,
            element_totals,
            largest,
            spg_frequencies,
            warnings: Vec::new(),
        };
        summary.warnings = summary.check(cards);
        summary
    }

    fn check(&self, cards: &TaskCardinalities) -> Vec<String> {
        let mut warnings = Vec::new();
        let out_of_range = |values: &BTreeSet<i64>, max: usize| {
            values.first().is_some_and(|&v| v < 1) || values.last().is_some_and(|&v| v > max as i64)
        };

        if out_of_range(&self.spg_values, cards.spg) {
            warnings.push(format!("SPG values out of expected range (1-{})", cards.spg));
        }
        if out_of_range(&self.crysystem_values, cards.crysystem) {
            warnings.push(format!("Crystal system values out of expected range (1-{})", cards.crysystem));
        }
        if self.samples > 0 && self.blt_values.len() != cards.blt {
            warnings.push(format!(
                "Unexpected number of unique Bravais lattice types ({}, expected {})",
                self.blt_values.len(),
                cards.blt
            ));
        }
        let unknown: Vec<&str> = self
            .element_totals
            .iter()
            .map(|(e, _)| e.as_str())
            .filter(|e| !ELEMENTS.contains(e))
            .collect();
        if !unknown.is_empty() {
            warnings.push(format!("Unknown element symbols: {}", unknown.join(", ")));
        }
        let present = self.element_totals.len() - unknown.len();
        if present < ELEMENTS.len() {
            warnings.push(format!(
                "Only {present} out of {} possible elements are present in the dataset",
                ELEMENTS.len()
            ));
        }
        warnings
    }

    /// Multi-line text report.
    pub fn report(&self) -> String {
        use std::fmt::Write;

        let range = |v: &BTreeSet<i64>| match (v.first(), v.last()) {
            (Some(lo), Some(hi)) => format!("{lo} - {hi}"),
            _                    => "n/a".to_string(),
        };

        let mut out = String::new();
        let _ = writeln!(out, "Total samples analyzed: {}", self.samples);
        let _ = writeln!(out, "\nSPG:\n  Range: {}\n  Unique values: {:?}", range(&self.spg_values), self.spg_values);
        let _ = writeln!(
            out,
            "\nCrystal System:\n  Range: {}\n  Unique values: {:?}",
            range(&self.crysystem_values),
            self.crysystem_values
        );
        for v in &self.crysystem_values {
            if let Some(name) = u32::try_from(*v).ok().and_then(crystal_system_name) {
                let _ = writeln!(out, "    {v}: {name}");
            }
        }
        let _ = writeln!(out, "\nBravais Lattice Type:\n  Unique values: {:?}", self.blt_values);
        let _ = writeln!(
            out,
            "\nComposition:\n  Min atoms: {}\n  Max atoms: {}\n  Total unique elements: {}",
            self.min_atoms,
            self.max_atoms,
            self.element_totals.len()
        );
        let _ = writeln!(out, "  Most common elements:");
        for (e, n) in &self.element_totals {
            let _ = writeln!(out, "    {e}: {n}");
        }
        let _ = writeln!(out, "\n{} Largest Compositions:", self.largest.len());
        for (size, formula) in &self.largest {
            let _ = writeln!(out, "  Size: {size}, Formula: {formula}");
        }
        let _ = writeln!(out, "\nSpace Group Frequencies:");
        for (spg, pct) in &self.spg_frequencies {
            let _ = writeln!(out, "  Space Group {spg}: {pct:.2}%");
        }
        for w in &self.warnings {
            let _ = writeln!(out, "\nWARNING: {w}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::tests::record;

    fn with_symbols(spg: i64, blt: i64, symbols: &[&str], formula: &str) -> PatternRecord {
        let mut r = record(4, spg, 1, blt);
        r.symbols = symbols.iter().map(|s| s.to_string()).collect();
        r.formula = Some(formula.to_string());
        r
    }

    #[test]
    fn test_counts_and_ranges() {
        let records = vec![
            with_symbols(225, 1, &["Na", "Cl"], "NaCl"),
            with_symbols(225, 2, &["Fe", "Fe", "O", "O", "O"], "Fe2O3"),
            with_symbols(14, 3, &["O"], "O"),
        ];
        let s = DatasetSummary::from_records(&records, &TaskCardinalities::reference());

        assert_eq!(s.samples, 3);
        assert_eq!(s.min_atoms, 1);
        assert_eq!(s.max_atoms, 5);
        assert_eq!(s.element_totals[0], ("O".to_string(), 4));
        assert_eq!(s.largest[0], (5, "Fe2O3".to_string()));
        assert_eq!(s.spg_frequencies[0].0, 225);
        assert!((s.spg_frequencies[0].1 - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_warnings() {
        let records = vec![with_symbols(231, 1, &["Na", "Xq"], "NaXq")];
        let s = DatasetSummary::from_records(&records, &TaskCardinalities::reference());

        assert!(s.warnings.iter().any(|w| w.starts_with("SPG values out of expected range")));
        assert!(s.warnings.iter().any(|w| w.contains("Bravais")));
        assert!(s.warnings.iter().any(|w| w.contains("Xq")));
        assert!(s.warnings.iter().any(|w| w.starts_with("Only 1 out of 118")));
    }

    #[test]
    fn test_largest_keeps_top_fifty() {
        let records: Vec<PatternRecord> = (1..=60)
            .map(|n| {
                let symbols = vec!["H"; n];
                with_symbols(1, 1, &symbols, &format!("H{n}"))
            })
            .collect();
        let s = DatasetSummary::from_records(&records, &TaskCardinalities::reference());
        assert_eq!(s.largest.len(), 50);
        assert_eq!(s.largest[0].0, 60);
        assert_eq!(s.largest[49].0, 11);
    }

    #[test]
    fn test_empty_dataset_report() {
        let s = DatasetSummary::from_records(&[], &TaskCardinalities::reference());
        assert_eq!(s.min_atoms, 0);
        assert!(s.report().contains("Total samples analyzed: 0"));
    }
}
