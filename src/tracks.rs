//! Side tracks drawn around the matrix: per-sample and per-gene bars,
//! transition/transversion fractions, expression values and highlighted cells.

use crate::error::{OncoError, Result};
use crate::matrix::OncoMatrix;
use crate::records::{RecordFilter, RecordSource};
use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

/// Per-category counts in first-seen order
pub type CategoryCounts = Vec<(String, usize)>;

fn bump(counts: &mut CategoryCounts, label: &str) {
    match counts.iter_mut().find(|(l, _)| l == label) {
        Some((_, n)) => *n += 1,
        None => counts.push((label.to_string(), 1)),
    }
}

/// Mutation burden of every displayed sample, over all genes of the source
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBar {
    pub counts: Vec<CategoryCounts>,
    pub totals: Vec<usize>,
}

impl ColumnBar {
    pub fn max_total(&self) -> usize {
        self.totals.iter().copied().max().unwrap_or(0)
    }
}

/// Count mutation records (copy-number events excluded) per displayed sample.
pub fn column_bar<S: RecordSource + ?Sized>(
    source: &S,
    matrix: &OncoMatrix,
    copy_number_labels: &FxHashSet<String>,
) -> ColumnBar {
    let samples: FxHashSet<String> = matrix.samples().iter().cloned().collect();
    let position: FxHashMap<&str, usize> = matrix
        .samples()
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();

    let mut counts = vec![CategoryCounts::new(); matrix.n_samples()];
    for record in source.records(RecordFilter { genes: None, samples: Some(&samples) }) {
        if record.category.is_empty() || copy_number_labels.contains(&record.category) {
            continue;
        }
        if let Some(&i) = position.get(record.sample.as_str()) {
            bump(&mut counts[i], &record.category);
        }
    }
    let totals = counts.iter().map(|c| c.iter().map(|(_, n)| n).sum()).collect();
    ColumnBar { counts, totals }
}

/// Alteration frequency of every displayed gene
#[derive(Debug, Clone, PartialEq)]
pub struct RowBar {
    pub altered: Vec<usize>,
    /// Percentage of the cohort, displayed or not
    pub percent: Vec<f64>,
    /// Cells per component category
    pub counts: Vec<CategoryCounts>,
}

pub fn row_bar(matrix: &OncoMatrix) -> RowBar {
    let cohort = matrix.cohort_size().max(1) as f64;
    let mut altered = Vec::with_capacity(matrix.n_genes());
    let mut percent = Vec::with_capacity(matrix.n_genes());
    let mut counts = Vec::with_capacity(matrix.n_genes());

    for g in 0..matrix.n_genes() {
        let n = matrix.altered_samples(g);
        let mut per_category = CategoryCounts::new();
        for s in 0..matrix.n_samples() {
            if let Some(alt) = matrix.cell(g, s) {
                for part in alt.components() {
                    bump(&mut per_category, part);
                }
            }
        }
        altered.push(n);
        percent.push(100.0 * n as f64 / cohort);
        counts.push(per_category);
    }
    RowBar { altered, percent, counts }
}

/// Strand-collapsed single-nucleotide substitution classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnvClass {
    CtoT,
    CtoG,
    CtoA,
    TtoA,
    TtoC,
    TtoG,
}

impl SnvClass {
    pub const ALL: [SnvClass; 6] = [
        SnvClass::CtoT,
        SnvClass::CtoG,
        SnvClass::CtoA,
        SnvClass::TtoA,
        SnvClass::TtoC,
        SnvClass::TtoG,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SnvClass::CtoT => "C>T",
            SnvClass::CtoG => "C>G",
            SnvClass::CtoA => "C>A",
            SnvClass::TtoA => "T>A",
            SnvClass::TtoC => "T>C",
            SnvClass::TtoG => "T>G",
        }
    }

    pub fn is_transition(self) -> bool {
        matches!(self, SnvClass::CtoT | SnvClass::TtoC)
    }

    fn index(self) -> usize {
        SnvClass::ALL.iter().position(|&c| c == self).unwrap_or(0)
    }
}

fn complement(base: u8) -> Option<u8> {
    match base {
        b'A' => Some(b'T'),
        b'C' => Some(b'G'),
        b'G' => Some(b'C'),
        b'T' => Some(b'A'),
        _ => None,
    }
}

/// Classify a substitution; anything but a single-base change yields `None`.
pub fn classify_snv(ref_allele: &str, alt_allele: &str) -> Option<SnvClass> {
    let (r, a) = match (ref_allele.as_bytes(), alt_allele.as_bytes()) {
        ([r], [a]) => (r.to_ascii_uppercase(), a.to_ascii_uppercase()),
        _ => return None,
    };
    complement(r)?;
    complement(a)?;
    if r == a {
        return None;
    }
    // Collapse to a pyrimidine reference
    let (r, a) = if r == b'G' || r == b'A' {
        (complement(r)?, complement(a)?)
    } else {
        (r, a)
    };
    match (r, a) {
        (b'C', b'T') => Some(SnvClass::CtoT),
        (b'C', b'G') => Some(SnvClass::CtoG),
        (b'C', b'A') => Some(SnvClass::CtoA),
        (b'T', b'A') => Some(SnvClass::TtoA),
        (b'T', b'C') => Some(SnvClass::TtoC),
        (b'T', b'G') => Some(SnvClass::TtoG),
        _ => None,
    }
}

/// Substitution spectrum of every displayed sample
#[derive(Debug, Clone, PartialEq)]
pub struct TiTvTrack {
    /// Fractions in [`SnvClass::ALL`] order; all zero for samples without SNVs
    pub fractions: Vec<[f64; 6]>,
    pub transitions: Vec<f64>,
    pub transversions: Vec<f64>,
}

pub fn titv_track<S: RecordSource + ?Sized>(source: &S, samples: &[String]) -> TiTvTrack {
    let wanted: FxHashSet<String> = samples.iter().cloned().collect();
    let position: FxHashMap<&str, usize> = samples.iter().enumerate().map(|(i, s)| (s.as_str(), i)).collect();

    let mut counts = vec![[0usize; 6]; samples.len()];
    let mut skipped = 0usize;
    for record in source.records(RecordFilter { genes: None, samples: Some(&wanted) }) {
        let class = match (record.ref_allele.as_deref(), record.alt_allele.as_deref()) {
            (Some(r), Some(a)) => classify_snv(r, a),
            _ => None,
        };
        match (class, position.get(record.sample.as_str())) {
            (Some(class), Some(&i)) => counts[i][class.index()] += 1,
            _ => skipped += 1,
        }
    }
    debug!("TiTv: {} record(s) without a classifiable SNV", skipped);

    let mut fractions = Vec::with_capacity(samples.len());
    let mut transitions = Vec::with_capacity(samples.len());
    let mut transversions = Vec::with_capacity(samples.len());
    for row in &counts {
        let total: usize = row.iter().sum();
        let mut f = [0.0; 6];
        if total > 0 {
            for (k, &n) in row.iter().enumerate() {
                f[k] = n as f64 / total as f64;
            }
        }
        let ti: f64 = SnvClass::ALL
            .iter()
            .filter(|c| c.is_transition())
            .map(|c| f[c.index()])
            .sum();
        fractions.push(f);
        transitions.push(ti);
        transversions.push(if total > 0 { 1.0 - ti } else { 0.0 });
    }
    TiTvTrack { fractions, transitions, transversions }
}

/// Caller-supplied per-gene values aligned to the gene order
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionTrack {
    pub values: Vec<Option<f64>>,
    pub min: f64,
    pub max: f64,
}

pub fn expression_track(values: &FxHashMap<String, f64>, genes: &[String]) -> ExpressionTrack {
    let aligned: Vec<Option<f64>> = genes.iter().map(|g| values.get(g).copied()).collect();
    let present = aligned.iter().flatten().copied();
    let min = present.clone().fold(f64::INFINITY, f64::min);
    let max = present.fold(f64::NEG_INFINITY, f64::max);
    ExpressionTrack { values: aligned, min, max }
}

/// Mark cells having at least one record whose `feature` equals `value`.
///
/// The mask is row-major over the matrix.
pub fn highlight_cells<S: RecordSource + ?Sized>(
    source: &S,
    matrix: &OncoMatrix,
    feature: &str,
    value: &str,
) -> Result<Vec<bool>> {
    let available = source.fields();
    if !available.iter().any(|f| f == feature) {
        return Err(OncoError::AdditionalFeatureNotFound { feature: feature.to_string(), available });
    }

    let genes: FxHashSet<String> = matrix.genes().iter().cloned().collect();
    let samples: FxHashSet<String> = matrix.samples().iter().cloned().collect();
    let mut mask = vec![false; matrix.n_genes() * matrix.n_samples()];
    for record in source.records(RecordFilter { genes: Some(&genes), samples: Some(&samples) }) {
        if record.fields.get(feature).map(String::as_str) != Some(value) {
            continue;
        }
        if let (Some(g), Some(s)) = (matrix.gene_index(&record.gene), matrix.sample_index(&record.sample)) {
            mask[g * matrix.n_samples() + s] = true;
        }
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{build_onco_matrix, BuildOptions, GeneSelection};
    use crate::records::{MafTable, MutationRecord};

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn table() -> MafTable {
        MafTable::new(vec![
            MutationRecord::new("S1", "TP53", "Missense_Mutation")
                .with_alleles("C", "T")
                .with_field("Hotspot", "yes"),
            MutationRecord::new("S1", "KRAS", "Missense_Mutation").with_alleles("G", "T"),
            MutationRecord::new("S1", "EGFR", "Amp"),
            MutationRecord::new("S2", "TP53", "Nonsense_Mutation")
                .with_alleles("A", "G")
                .with_field("Hotspot", "no"),
            MutationRecord::new("S2", "BRAF", "Frame_Shift_Del").with_alleles("CT", "-"),
        ])
        .with_cohort(["S3", "S4"])
    }

    fn matrix(source: &MafTable) -> OncoMatrix {
        build_onco_matrix(
            source,
            &GeneSelection::Explicit(names(&["TP53", "KRAS", "EGFR"])),
            &BuildOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn classifies_with_strand_collapse() {
        assert_eq!(classify_snv("C", "T"), Some(SnvClass::CtoT));
        assert_eq!(classify_snv("G", "A"), Some(SnvClass::CtoT));
        assert_eq!(classify_snv("a", "g"), Some(SnvClass::TtoC));
        assert_eq!(classify_snv("G", "T"), Some(SnvClass::CtoA));
        assert_eq!(classify_snv("C", "C"), None);
        assert_eq!(classify_snv("CT", "-"), None);
        assert_eq!(classify_snv("N", "A"), None);
    }

    #[test]
    fn column_bar_counts_mutations_over_all_genes() {
        let source = table();
        let m = matrix(&source);
        let bar = column_bar(&source, &m, &BuildOptions::default().copy_number_labels);
        assert_eq!(m.samples(), &names(&["S1", "S2"])[..]);
        // S1: two missense, Amp excluded; S2: nonsense + BRAF frame shift
        assert_eq!(bar.totals, vec![2, 2]);
        assert_eq!(bar.counts[0], vec![("Missense_Mutation".to_string(), 2)]);
        assert_eq!(bar.max_total(), 2);
    }

    #[test]
    fn row_bar_uses_cohort_size() {
        let source = table();
        let m = matrix(&source);
        let bar = row_bar(&m);
        assert_eq!(bar.altered, vec![2, 1, 1]);
        assert_eq!(bar.percent, vec![50.0, 25.0, 25.0]);
        assert_eq!(bar.counts[0].len(), 2);
    }

    #[test]
    fn titv_fractions_per_sample() {
        let source = table();
        let track = titv_track(&source, &names(&["S1", "S2", "S3"]));
        assert_eq!(track.fractions[0][SnvClass::CtoT.index()], 0.5);
        assert_eq!(track.fractions[0][SnvClass::CtoA.index()], 0.5);
        assert_eq!(track.transitions, vec![0.5, 1.0, 0.0]);
        assert_eq!(track.transversions, vec![0.5, 0.0, 0.0]);
    }

    #[test]
    fn expression_aligns_to_gene_order() {
        let values: FxHashMap<String, f64> = [("KRAS".to_string(), 2.5), ("TP53".to_string(), -1.0)]
            .into_iter()
            .collect();
        let track = expression_track(&values, &names(&["TP53", "EGFR", "KRAS"]));
        assert_eq!(track.values, vec![Some(-1.0), None, Some(2.5)]);
        assert_eq!((track.min, track.max), (-1.0, 2.5));
    }

    #[test]
    fn highlight_marks_matching_cells() {
        let source = table();
        let m = matrix(&source);
        let mask = highlight_cells(&source, &m, "Hotspot", "yes").unwrap();
        let tp53 = m.gene_index("TP53").unwrap();
        let s1 = m.sample_index("S1").unwrap();
        assert!(mask[tp53 * m.n_samples() + s1]);
        assert_eq!(mask.iter().filter(|&&b| b).count(), 1);
    }

    #[test]
    fn highlight_on_unknown_field_lists_available() {
        let source = table();
        let m = matrix(&source);
        match highlight_cells(&source, &m, "Transcript", "NM_000546") {
            Err(OncoError::AdditionalFeatureNotFound { available, .. }) => assert_eq!(available, names(&["Hotspot"])),
            other => panic!("unexpected {:?}", other),
        }
    }
}
