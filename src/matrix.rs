//! Gene × sample alteration matrix and its builder.
//!
//! Labels and numeric codes live side by side in one [`OncoMatrix`], sharing a
//! single gene key vector and a single sample key vector. Every reordering or
//! filtering operation permutes both in one step and re-checks their shape.

use crate::error::{OncoError, Result};
use crate::records::{MutationRecord, RecordFilter, RecordSource};
use log::{debug, info, warn};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;

/// Several distinct variant classes in one cell
pub const MULTI_HIT: &str = "Multi_Hit";
/// Several distinct copy-number events in one cell
pub const COMPLEX_EVENT: &str = "Complex_Event";
/// Separator of composite labels in the text dump
pub const LABEL_SEPARATOR: char = ';';

/// What happened to one gene in one sample.
///
/// A point mutation co-occurring with a copy-number event keeps both parts:
/// the mutation is `primary`, the copy-number event `secondary`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Alteration {
    pub primary: String,
    pub secondary: Option<String>,
}

impl Alteration {
    pub fn single(category: &str) -> Self {
        Alteration { primary: category.to_string(), secondary: None }
    }

    pub fn composite(mutation: &str, copy_number: &str) -> Self {
        Alteration {
            primary: mutation.to_string(),
            secondary: Some(copy_number.to_string()),
        }
    }

    pub fn is_composite(&self) -> bool {
        self.secondary.is_some()
    }

    /// Canonical label, `primary` or `primary;secondary`
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Component categories, primary first
    pub fn components(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.secondary.as_deref())
    }

    /// Components must be non-empty and free of [`LABEL_SEPARATOR`], so that
    /// the label parses back to the same alteration.
    pub fn validate(&self) -> Result<()> {
        if self.components().any(|c| c.is_empty() || c.contains(LABEL_SEPARATOR)) {
            return Err(OncoError::InvalidCell(self.label()));
        }
        Ok(())
    }
}

/// Raw record category with [`LABEL_SEPARATOR`] replaced by `_`.
pub fn clean_category(raw: &str) -> Cow<'_, str> {
    if raw.contains(LABEL_SEPARATOR) {
        Cow::Owned(raw.replace(LABEL_SEPARATOR, "_"))
    } else {
        Cow::Borrowed(raw)
    }
}

impl fmt::Display for Alteration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.secondary {
            Some(secondary) => write!(f, "{}{}{}", self.primary, LABEL_SEPARATOR, secondary),
            None => f.write_str(&self.primary),
        }
    }
}

impl FromStr for Alteration {
    type Err = OncoError;

    fn from_str(label: &str) -> Result<Self> {
        let parts: Vec<&str> = label.split(LABEL_SEPARATOR).collect();
        match parts.as_slice() {
            [primary] if !primary.is_empty() => Ok(Alteration::single(primary)),
            [primary, secondary] if !primary.is_empty() && !secondary.is_empty() => {
                Ok(Alteration::composite(primary, secondary))
            }
            _ => Err(OncoError::InvalidCell(label.to_string())),
        }
    }
}

/// Collapse the distinct categories seen in one cell into a single alteration.
pub fn collapse_cell<S: AsRef<str>>(mutations: &BTreeSet<S>, copy_numbers: &BTreeSet<S>) -> Option<Alteration> {
    let mutation = match mutations.len() {
        0 => None,
        1 => mutations.iter().next().map(|c| c.as_ref()),
        _ => Some(MULTI_HIT),
    };
    let copy_number = match copy_numbers.len() {
        0 => None,
        1 => copy_numbers.iter().next().map(|c| c.as_ref()),
        _ => Some(COMPLEX_EVENT),
    };

    match (mutation, copy_number) {
        (Some(m), Some(c)) => Some(Alteration::composite(m, c)),
        (Some(m), None) => Some(Alteration::single(m)),
        (None, Some(c)) => Some(Alteration::single(c)),
        (None, None) => None,
    }
}

/// Bijection between alteration labels and integer codes; 0 means unaltered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryCodes {
    labels: Vec<String>,
    index: FxHashMap<Alteration, u32>,
}

impl CategoryCodes {
    /// Codes follow descending cell count, then label.
    fn from_cells<'a>(cells: impl Iterator<Item = &'a Alteration>) -> Self {
        let mut counts: FxHashMap<&Alteration, usize> = FxHashMap::default();
        for cell in cells {
            *counts.entry(cell).or_insert(0) += 1;
        }
        let mut ranked: Vec<(String, &Alteration, usize)> =
            counts.into_iter().map(|(alt, n)| (alt.label(), alt, n)).collect();
        ranked.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));

        let mut labels = Vec::with_capacity(ranked.len());
        let mut index = FxHashMap::default();
        for (i, (label, alt, _)) in ranked.into_iter().enumerate() {
            index.insert(alt.clone(), i as u32 + 1);
            labels.push(label);
        }
        CategoryCodes { labels, index }
    }

    pub fn code_of(&self, alteration: &Alteration) -> Option<u32> {
        self.index.get(alteration).copied()
    }

    /// Code of a canonical label such as `Missense_Mutation;Amp`
    pub fn code(&self, label: &str) -> Option<u32> {
        label.parse::<Alteration>().ok().and_then(|alt| self.code_of(&alt))
    }

    pub fn label(&self, code: u32) -> Option<&str> {
        if code == 0 {
            return None;
        }
        self.labels.get(code as usize - 1).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `(code, label)` pairs in code order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.labels.iter().enumerate().map(|(i, l)| (i as u32 + 1, l.as_str()))
    }
}

/// Alteration labels plus their numeric codes over genes × samples
#[derive(Debug, Clone, PartialEq)]
pub struct OncoMatrix {
    genes: Vec<String>,
    samples: Vec<String>,
    /// Row-major, one entry per (gene, sample)
    cells: Vec<Option<Alteration>>,
    codes: Vec<u32>,
    categories: CategoryCodes,
    cohort_size: usize,
}

impl OncoMatrix {
    /// Assemble a matrix from row-major cells and derive its codes.
    pub fn from_cells(
        genes: Vec<String>,
        samples: Vec<String>,
        cells: Vec<Option<Alteration>>,
        cohort_size: usize,
    ) -> Result<Self> {
        if cells.len() != genes.len() * samples.len() {
            return Err(OncoError::ParityViolation(format!(
                "{} cells for {} genes x {} samples",
                cells.len(),
                genes.len(),
                samples.len()
            )));
        }
        check_unique("gene", &genes)?;
        check_unique("sample", &samples)?;
        for alt in cells.iter().flatten() {
            alt.validate()?;
        }

        let categories = CategoryCodes::from_cells(cells.iter().flatten());
        let codes = cells
            .iter()
            .map(|cell| match cell {
                Some(alt) => categories.code_of(alt).unwrap_or(0),
                None => 0,
            })
            .collect();

        let matrix = OncoMatrix {
            genes,
            samples,
            cells,
            codes,
            categories,
            cohort_size,
        };
        matrix.check_parity()?;
        Ok(matrix)
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn categories(&self) -> &CategoryCodes {
        &self.categories
    }

    /// Number of samples in the cohort, displayed or not.
    pub fn cohort_size(&self) -> usize {
        self.cohort_size
    }

    pub fn gene_index(&self, gene: &str) -> Option<usize> {
        self.genes.iter().position(|g| g == gene)
    }

    pub fn sample_index(&self, sample: &str) -> Option<usize> {
        self.samples.iter().position(|s| s == sample)
    }

    pub fn cell(&self, gene: usize, sample: usize) -> Option<&Alteration> {
        self.cells[gene * self.samples.len() + sample].as_ref()
    }

    pub fn code(&self, gene: usize, sample: usize) -> u32 {
        self.codes[gene * self.samples.len() + sample]
    }

    /// Numeric codes of one gene across all samples
    pub fn code_row(&self, gene: usize) -> &[u32] {
        let n = self.samples.len();
        &self.codes[gene * n..(gene + 1) * n]
    }

    pub fn is_altered(&self, gene: usize, sample: usize) -> bool {
        self.code(gene, sample) != 0
    }

    /// Samples altered in this gene
    pub fn altered_samples(&self, gene: usize) -> usize {
        self.code_row(gene).iter().filter(|&&c| c != 0).count()
    }

    /// Genes altered in this sample
    pub fn altered_genes(&self, sample: usize) -> usize {
        (0..self.genes.len()).filter(|&g| self.is_altered(g, sample)).count()
    }

    /// Distinct component categories (composites split), in code order.
    pub fn category_labels(&self) -> Vec<String> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut labels = Vec::new();
        for (_, label) in self.categories.iter() {
            for part in label.split(LABEL_SEPARATOR) {
                if seen.insert(part) {
                    labels.push(part.to_string());
                }
            }
        }
        labels
    }

    /// Keep the given rows, in the given order.
    pub fn select_genes(&mut self, order: &[usize]) -> Result<()> {
        check_indices("gene", order, self.genes.len())?;
        let n = self.samples.len();
        let mut cells = Vec::with_capacity(order.len() * n);
        let mut codes = Vec::with_capacity(order.len() * n);
        for &g in order {
            cells.extend_from_slice(&self.cells[g * n..(g + 1) * n]);
            codes.extend_from_slice(&self.codes[g * n..(g + 1) * n]);
        }
        self.genes = order.iter().map(|&g| self.genes[g].clone()).collect();
        self.cells = cells;
        self.codes = codes;
        self.check_parity()
    }

    /// Keep the given columns, in the given order.
    pub fn select_samples(&mut self, order: &[usize]) -> Result<()> {
        check_indices("sample", order, self.samples.len())?;
        let n = self.samples.len();
        let mut cells = Vec::with_capacity(self.genes.len() * order.len());
        let mut codes = Vec::with_capacity(self.genes.len() * order.len());
        for g in 0..self.genes.len() {
            for &s in order {
                cells.push(self.cells[g * n + s].clone());
                codes.push(self.codes[g * n + s]);
            }
        }
        self.samples = order.iter().map(|&s| self.samples[s].clone()).collect();
        self.cells = cells;
        self.codes = codes;
        self.check_parity()
    }

    /// Reorder rows by a full permutation.
    pub fn reorder_genes(&mut self, order: &[usize]) -> Result<()> {
        if order.len() != self.genes.len() {
            return Err(OncoError::ParityViolation(format!(
                "gene permutation has {} entries for {} rows",
                order.len(),
                self.genes.len()
            )));
        }
        self.select_genes(order)
    }

    /// Reorder columns by a full permutation.
    pub fn reorder_samples(&mut self, order: &[usize]) -> Result<()> {
        if order.len() != self.samples.len() {
            return Err(OncoError::ParityViolation(format!(
                "sample permutation has {} entries for {} columns",
                order.len(),
                self.samples.len()
            )));
        }
        self.select_samples(order)
    }

    /// Labels and codes must describe the same cells under the same keys.
    pub fn check_parity(&self) -> Result<()> {
        let expected = self.genes.len() * self.samples.len();
        if self.cells.len() != expected || self.codes.len() != expected {
            return Err(OncoError::ParityViolation(format!(
                "{} labels and {} codes for {} genes x {} samples",
                self.cells.len(),
                self.codes.len(),
                self.genes.len(),
                self.samples.len()
            )));
        }
        for (cell, &code) in self.cells.iter().zip(&self.codes) {
            let coded = match cell {
                Some(alt) => self.categories.code_of(alt).unwrap_or(0),
                None => 0,
            };
            if coded != code || (cell.is_some() && code == 0) {
                return Err(OncoError::ParityViolation(format!(
                    "cell {:?} carries code {}",
                    cell.as_ref().map(Alteration::label),
                    code
                )));
            }
        }
        Ok(())
    }
}

fn check_unique(kind: &str, keys: &[String]) -> Result<()> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for key in keys {
        if !seen.insert(key) {
            return Err(OncoError::ParityViolation(format!("duplicate {} '{}'", kind, key)));
        }
    }
    Ok(())
}

fn check_indices(kind: &str, order: &[usize], len: usize) -> Result<()> {
    let mut used = vec![false; len];
    for &i in order {
        if i >= len || used[i] {
            return Err(OncoError::ParityViolation(format!(
                "invalid {} index {} in selection of {}",
                kind, i, len
            )));
        }
        used[i] = true;
    }
    Ok(())
}

/// Which genes become matrix rows
#[derive(Debug, Clone, PartialEq)]
pub enum GeneSelection {
    /// Exactly these genes, in this order
    Explicit(Vec<String>),
    /// The most frequently altered genes of the source
    Top(usize),
}

impl Default for GeneSelection {
    fn default() -> Self {
        GeneSelection::Top(20)
    }
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Keep requested genes without records and cohort samples without
    /// alterations as all-zero rows and columns.
    pub add_missing: bool,
    /// Record categories that denote copy-number events
    pub copy_number_labels: FxHashSet<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            add_missing: false,
            copy_number_labels: ["Amp", "Del"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Per-cell category sets of one sample, keyed by gene
type SampleCells<'a> = FxHashMap<&'a str, (BTreeSet<Cow<'a, str>>, BTreeSet<Cow<'a, str>>)>;

fn aggregate_sample<'a>(
    records: &[&'a MutationRecord],
    options: &BuildOptions,
) -> SampleCells<'a> {
    let mut cells: SampleCells<'a> = FxHashMap::default();
    for record in records {
        let entry = cells.entry(record.gene.as_str()).or_default();
        let category = record.category.as_str();
        if options.copy_number_labels.contains(category) {
            entry.1.insert(clean_category(category));
        } else if !category.is_empty() {
            entry.0.insert(clean_category(category));
        }
        if let Some(cn) = record.copy_number.as_deref().filter(|c| !c.is_empty()) {
            entry.1.insert(clean_category(cn));
        }
    }
    cells
}

/// The `n` genes altered in the most samples, ties by gene identifier.
pub fn top_altered_genes<S: RecordSource + ?Sized>(source: &S, n: usize) -> Vec<String> {
    let mut altered: FxHashMap<&str, FxHashSet<&str>> = FxHashMap::default();
    for record in source.records(RecordFilter::default()) {
        if record.category.is_empty() && record.copy_number.as_deref().map_or(true, str::is_empty) {
            continue;
        }
        altered.entry(record.gene.as_str()).or_default().insert(record.sample.as_str());
    }
    let mut ranked: Vec<(&str, usize)> = altered.into_iter().map(|(g, s)| (g, s.len())).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().take(n).map(|(g, _)| g.to_string()).collect()
}

/// Build the alteration matrix for the selected genes.
///
/// Unknown genes are dropped with a warning unless `add_missing` is set, in
/// which case they become all-zero rows. Fewer than two remaining genes is
/// fatal.
pub fn build_onco_matrix<S: RecordSource + ?Sized>(
    source: &S,
    selection: &GeneSelection,
    options: &BuildOptions,
) -> Result<OncoMatrix> {
    let known: FxHashSet<String> = source.genes().into_iter().collect();

    let requested = match selection {
        GeneSelection::Explicit(genes) => genes.clone(),
        GeneSelection::Top(n) => top_altered_genes(source, *n),
    };

    let mut genes = Vec::with_capacity(requested.len());
    let mut unresolved = Vec::new();
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for gene in &requested {
        if !seen.insert(gene.as_str()) {
            debug!("Ignoring duplicate gene {}", gene);
            continue;
        }
        if known.contains(gene) || options.add_missing {
            genes.push(gene.clone());
        } else {
            unresolved.push(gene.clone());
        }
    }
    if !unresolved.is_empty() {
        warn!(
            "{} requested gene(s) not found in records and skipped: {}",
            unresolved.len(),
            unresolved.join(", ")
        );
    }
    if genes.len() < 2 {
        return Err(OncoError::InsufficientGenes { found: genes.len() });
    }

    // Group records by sample, then aggregate each sample independently
    let gene_set: FxHashSet<String> = genes.iter().cloned().collect();
    let mut by_sample: FxHashMap<&str, Vec<&MutationRecord>> = FxHashMap::default();
    let mut renamed: BTreeSet<&str> = BTreeSet::new();
    for record in source.records(RecordFilter { genes: Some(&gene_set), samples: None }) {
        for raw in std::iter::once(record.category.as_str()).chain(record.copy_number.as_deref()) {
            if raw.contains(LABEL_SEPARATOR) {
                renamed.insert(raw);
            }
        }
        by_sample.entry(record.sample.as_str()).or_default().push(record);
    }
    if !renamed.is_empty() {
        warn!(
            "{} category label(s) contain '{}', replaced by '_': {}",
            renamed.len(),
            LABEL_SEPARATOR,
            renamed.iter().copied().collect::<Vec<_>>().join(", ")
        );
    }

    let cohort = source.samples();
    let aggregated: Vec<SampleCells<'_>> = cohort
        .par_iter()
        .map(|sample| match by_sample.get(sample.as_str()) {
            Some(records) => aggregate_sample(records, options),
            None => FxHashMap::default(),
        })
        .collect();

    let columns: Vec<usize> = (0..cohort.len())
        .filter(|&i| {
            options.add_missing
                || aggregated[i]
                    .values()
                    .any(|(m, c)| !m.is_empty() || !c.is_empty())
        })
        .collect();

    let mut cells = Vec::with_capacity(genes.len() * columns.len());
    for gene in &genes {
        for &s in &columns {
            let cell = aggregated[s]
                .get(gene.as_str())
                .and_then(|(m, c)| collapse_cell(m, c));
            cells.push(cell);
        }
    }

    let samples: Vec<String> = columns.iter().map(|&i| cohort[i].clone()).collect();
    let cohort_size = source.cohort_size().max(samples.len());
    info!(
        "Built {} x {} alteration matrix ({} samples in cohort)",
        genes.len(),
        samples.len(),
        cohort_size
    );
    OncoMatrix::from_cells(genes, samples, cells, cohort_size)
}

/// Write the matrix as tab-separated text.
///
/// The header holds the sample identifiers only; every following line is a
/// gene identifier and one label per sample, empty when unaltered.
pub fn write_matrix_tsv<W: Write>(matrix: &OncoMatrix, mut out: W) -> Result<()> {
    writeln!(out, "{}", matrix.samples.join("\t"))?;
    for (g, gene) in matrix.genes.iter().enumerate() {
        let mut line = gene.clone();
        for s in 0..matrix.samples.len() {
            line.push('\t');
            if let Some(alt) = matrix.cell(g, s) {
                line.push_str(&alt.label());
            }
        }
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

/// Parse the output of [`write_matrix_tsv`].
pub fn read_matrix_tsv<R: BufRead>(reader: R) -> Result<OncoMatrix> {
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => line?,
        None => return Err(OncoError::Parse { line: 0, reason: "empty matrix".to_string() }),
    };
    let samples: Vec<String> = if header.is_empty() {
        Vec::new()
    } else {
        header.split('\t').map(str::to_string).collect()
    };

    let mut genes = Vec::new();
    let mut cells = Vec::new();
    for (i, line) in lines.enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() != samples.len() + 1 {
            return Err(OncoError::Parse {
                line: i + 2,
                reason: format!("expected {} fields, found {}", samples.len() + 1, parts.len()),
            });
        }
        genes.push(parts[0].to_string());
        for label in &parts[1..] {
            cells.push(if label.is_empty() { None } else { Some(label.parse()?) });
        }
    }

    let cohort_size = samples.len();
    OncoMatrix::from_cells(genes, samples, cells, cohort_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::MafTable;
    use std::io::Cursor;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn collapses_multiple_mutations_to_multi_hit() {
        let table = MafTable::new(vec![
            MutationRecord::new("S1", "TP53", "Missense_Mutation"),
            MutationRecord::new("S1", "TP53", "Nonsense_Mutation"),
            MutationRecord::new("S1", "KRAS", "Missense_Mutation"),
            MutationRecord::new("S1", "KRAS", "Missense_Mutation"),
        ]);
        let m = build_onco_matrix(&table, &GeneSelection::Explicit(names(&["TP53", "KRAS"])), &BuildOptions::default())
            .unwrap();
        assert_eq!(m.cell(0, 0), Some(&Alteration::single(MULTI_HIT)));
        assert_eq!(m.cell(1, 0), Some(&Alteration::single("Missense_Mutation")));
    }

    #[test]
    fn keeps_mutation_and_copy_number_as_composite() {
        let table = MafTable::new(vec![
            MutationRecord::new("S1", "EGFR", "Missense_Mutation"),
            MutationRecord::new("S1", "EGFR", "Amp"),
            MutationRecord::new("S1", "PTEN", "Del"),
            MutationRecord::new("S2", "PTEN", "Frame_Shift_Del").with_copy_number("Del"),
        ]);
        let m = build_onco_matrix(&table, &GeneSelection::Explicit(names(&["EGFR", "PTEN"])), &BuildOptions::default())
            .unwrap();
        let egfr = m.cell(0, 0).unwrap();
        assert!(egfr.is_composite());
        assert_eq!(egfr.label(), "Missense_Mutation;Amp");
        assert_eq!(m.cell(1, 0).unwrap().label(), "Del");
        assert_eq!(m.cell(1, 1).unwrap().label(), "Frame_Shift_Del;Del");
    }

    #[test]
    fn several_copy_number_events_become_complex() {
        let muts: BTreeSet<&str> = ["Silent"].into_iter().collect();
        let cns: BTreeSet<&str> = ["Amp", "Del"].into_iter().collect();
        let alt = collapse_cell(&muts, &cns).unwrap();
        assert_eq!(alt, Alteration::composite("Silent", COMPLEX_EVENT));
        assert_eq!(collapse_cell(&BTreeSet::<&str>::new(), &BTreeSet::new()), None);
    }

    #[test]
    fn add_missing_keeps_zero_rows_and_columns() {
        let table = MafTable::new(vec![MutationRecord::new("S1", "G1", "Missense_Mutation")])
            .with_cohort(["S2"]);
        let options = BuildOptions { add_missing: true, ..Default::default() };
        let m = build_onco_matrix(&table, &GeneSelection::Explicit(names(&["G1", "G4"])), &options).unwrap();
        assert_eq!(m.genes(), &names(&["G1", "G4"])[..]);
        assert_eq!(m.samples(), &names(&["S1", "S2"])[..]);
        assert!(m.code_row(1).iter().all(|&c| c == 0));
        assert_eq!(m.cohort_size(), 2);
    }

    #[test]
    fn unknown_genes_are_dropped_without_add_missing() {
        let table = MafTable::new(vec![
            MutationRecord::new("S1", "G1", "Silent"),
            MutationRecord::new("S2", "G2", "Silent"),
        ]);
        let m = build_onco_matrix(&table, &GeneSelection::Explicit(names(&["G1", "G9", "G2"])), &BuildOptions::default())
            .unwrap();
        assert_eq!(m.genes(), &names(&["G1", "G2"])[..]);
    }

    #[test]
    fn fewer_than_two_genes_is_fatal() {
        let table = MafTable::new(vec![MutationRecord::new("S1", "G1", "Silent")]);
        let err = build_onco_matrix(&table, &GeneSelection::Explicit(names(&["G1", "G9"])), &BuildOptions::default())
            .unwrap_err();
        assert!(matches!(err, OncoError::InsufficientGenes { found: 1 }));
    }

    #[test]
    fn unaltered_samples_are_omitted_by_default() {
        let table = MafTable::new(vec![
            MutationRecord::new("S1", "G1", "Silent"),
            MutationRecord::new("S2", "G3", "Silent"),
            MutationRecord::new("S3", "G2", "Silent"),
        ]);
        let m = build_onco_matrix(&table, &GeneSelection::Explicit(names(&["G1", "G2"])), &BuildOptions::default())
            .unwrap();
        assert_eq!(m.samples(), &names(&["S1", "S3"])[..]);
        assert_eq!(m.cohort_size(), 3);
    }

    #[test]
    fn top_genes_rank_by_altered_samples() {
        let table = MafTable::new(vec![
            MutationRecord::new("S1", "B", "Silent"),
            MutationRecord::new("S2", "B", "Silent"),
            MutationRecord::new("S1", "A", "Silent"),
            MutationRecord::new("S1", "A", "Silent"),
            MutationRecord::new("S2", "C", "Silent"),
        ]);
        assert_eq!(top_altered_genes(&table, 2), names(&["B", "A"]));
    }

    #[test]
    fn separator_in_a_category_is_replaced_at_build_time() {
        let table = MafTable::new(vec![
            MutationRecord::new("S1", "G1", "In_Frame_Del;Splice_Site").with_copy_number("Amp"),
            MutationRecord::new("S1", "G2", "Silent"),
        ]);
        let m = build_onco_matrix(&table, &GeneSelection::Explicit(names(&["G1", "G2"])), &BuildOptions::default())
            .unwrap();
        assert_eq!(m.cell(0, 0), Some(&Alteration::composite("In_Frame_Del_Splice_Site", "Amp")));

        let mut buf = Vec::new();
        write_matrix_tsv(&m, &mut buf).unwrap();
        let back = read_matrix_tsv(Cursor::new(buf)).unwrap();
        assert_eq!(back.cell(0, 0), m.cell(0, 0));
        assert_eq!(back.cell(1, 0), m.cell(1, 0));
    }

    #[test]
    fn cells_with_separator_in_a_component_are_rejected() {
        let cells = vec![Some(Alteration::single("A;B")), Some(Alteration::composite("A", "B"))];
        let err = OncoMatrix::from_cells(names(&["G1", "G2"]), names(&["S1"]), cells, 1).unwrap_err();
        assert!(matches!(err, OncoError::InvalidCell(label) if label == "A;B"));
    }

    #[test]
    fn single_and_composite_alterations_get_distinct_codes() {
        let cells = vec![Some(Alteration::single("A")), Some(Alteration::composite("A", "B"))];
        let m = OncoMatrix::from_cells(names(&["G1", "G2"]), names(&["S1"]), cells, 1).unwrap();
        assert_eq!(m.categories().len(), 2);
        assert_ne!(m.code(0, 0), m.code(1, 0));
        assert_eq!(m.categories().code_of(&Alteration::composite("A", "B")), Some(m.code(1, 0)));
    }

    #[test]
    fn records_without_any_category_do_not_rank() {
        let table = MafTable::new(vec![
            MutationRecord::new("S1", "A", ""),
            MutationRecord::new("S2", "A", ""),
            MutationRecord::new("S1", "B", "Silent"),
            MutationRecord::new("S1", "C", "").with_copy_number("Amp"),
        ]);
        assert_eq!(top_altered_genes(&table, 2), names(&["B", "C"]));
    }

    #[test]
    fn codes_follow_frequency_then_label() {
        let cells = vec![
            Some(Alteration::single("Silent")),
            Some(Alteration::single("Amp")),
            Some(Alteration::single("Silent")),
            None,
        ];
        let m = OncoMatrix::from_cells(names(&["G1", "G2"]), names(&["S1", "S2"]), cells, 2).unwrap();
        assert_eq!(m.categories().code("Silent"), Some(1));
        assert_eq!(m.categories().code("Amp"), Some(2));
        assert_eq!(m.categories().label(0), None);
        assert_eq!(m.code(1, 1), 0);
    }

    #[test]
    fn reordering_keeps_labels_and_codes_together() {
        let cells = vec![
            Some(Alteration::single("A")),
            None,
            Some(Alteration::composite("B", "Amp")),
            None,
            Some(Alteration::single("A")),
            None,
        ];
        let mut m = OncoMatrix::from_cells(names(&["G1", "G2"]), names(&["S1", "S2", "S3"]), cells, 3).unwrap();
        m.reorder_samples(&[2, 0, 1]).unwrap();
        m.reorder_genes(&[1, 0]).unwrap();
        assert_eq!(m.samples(), &names(&["S3", "S1", "S2"])[..]);
        assert_eq!(m.genes(), &names(&["G2", "G1"])[..]);
        assert_eq!(m.cell(1, 0).unwrap().label(), "B;Amp");
        assert_eq!(m.code(1, 0), m.categories().code("B;Amp").unwrap());
        m.check_parity().unwrap();

        m.select_samples(&[1]).unwrap();
        assert_eq!(m.samples(), &names(&["S1"])[..]);
        m.check_parity().unwrap();
    }

    #[test]
    fn invalid_permutations_are_rejected() {
        let mut m = OncoMatrix::from_cells(names(&["G1", "G2"]), names(&["S1"]), vec![None, None], 1).unwrap();
        assert!(m.reorder_genes(&[0, 0]).is_err());
        assert!(m.reorder_genes(&[0]).is_err());
        assert!(m.select_samples(&[3]).is_err());
    }

    #[test]
    fn category_labels_split_composites() {
        let cells = vec![Some(Alteration::composite("Missense_Mutation", "Amp")), Some(Alteration::single("Amp"))];
        let m = OncoMatrix::from_cells(names(&["G1", "G2"]), names(&["S1"]), cells, 1).unwrap();
        let mut labels = m.category_labels();
        labels.sort();
        assert_eq!(labels, names(&["Amp", "Missense_Mutation"]));
    }

    #[test]
    fn tsv_dump_round_trips() {
        let cells = vec![
            Some(Alteration::single("Missense_Mutation")),
            None,
            Some(Alteration::composite("Nonsense_Mutation", "Del")),
            Some(Alteration::single(MULTI_HIT)),
        ];
        let m = OncoMatrix::from_cells(names(&["TP53", "KRAS"]), names(&["S1", "S2"]), cells, 2).unwrap();

        let mut buf = Vec::new();
        write_matrix_tsv(&m, &mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert_eq!(
            text,
            "S1\tS2\nTP53\tMissense_Mutation\t\nKRAS\tNonsense_Mutation;Del\tMulti_Hit\n"
        );

        let back = read_matrix_tsv(Cursor::new(buf)).unwrap();
        assert_eq!(back.genes(), m.genes());
        assert_eq!(back.samples(), m.samples());
        for g in 0..2 {
            for s in 0..2 {
                assert_eq!(back.cell(g, s), m.cell(g, s));
            }
        }
    }

    #[test]
    fn labels_with_more_than_two_parts_are_invalid() {
        assert!("A;B;C".parse::<Alteration>().is_err());
        assert!(";Amp".parse::<Alteration>().is_err());
        assert_eq!("A;B".parse::<Alteration>().unwrap(), Alteration::composite("A", "B"));
    }
}
