//! Mutation records and the sources that serve them.

use crate::error::{OncoError, Result};
use log::{debug, info};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const SAMPLE_COLUMN: &str = "Tumor_Sample_Barcode";
const GENE_COLUMN: &str = "Hugo_Symbol";
const CATEGORY_COLUMN: &str = "Variant_Classification";
const COPY_NUMBER_COLUMN: &str = "Copy_Number";
const REF_COLUMN: &str = "Reference_Allele";
const ALT_COLUMN: &str = "Tumor_Seq_Allele2";

/// One alteration observed in one sample
#[derive(Debug, Clone, Default)]
pub struct MutationRecord {
    pub sample: String,
    pub gene: String,
    /// Variant class, or a copy-number label such as `Amp`
    pub category: String,
    /// Copy-number event reported alongside the record
    pub copy_number: Option<String>,
    pub ref_allele: Option<String>,
    pub alt_allele: Option<String>,
    /// Any further columns, keyed by header name
    pub fields: FxHashMap<String, String>,
}

impl MutationRecord {
    pub fn new(sample: &str, gene: &str, category: &str) -> Self {
        MutationRecord {
            sample: sample.to_string(),
            gene: gene.to_string(),
            category: category.to_string(),
            ..Default::default()
        }
    }

    pub fn with_copy_number(mut self, copy_number: &str) -> Self {
        self.copy_number = Some(copy_number.to_string());
        self
    }

    pub fn with_alleles(mut self, ref_allele: &str, alt_allele: &str) -> Self {
        self.ref_allele = Some(ref_allele.to_string());
        self.alt_allele = Some(alt_allele.to_string());
        self
    }

    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }
}

/// Restricts which records a source yields
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordFilter<'a> {
    pub genes: Option<&'a FxHashSet<String>>,
    pub samples: Option<&'a FxHashSet<String>>,
}

impl RecordFilter<'_> {
    pub fn accepts(&self, record: &MutationRecord) -> bool {
        self.genes.map_or(true, |g| g.contains(&record.gene))
            && self.samples.map_or(true, |s| s.contains(&record.sample))
    }
}

/// Anything that can serve mutation records to the matrix builder.
///
/// Sample and gene lists are distinct and in first-seen order; callers rely on
/// that order for deterministic output.
pub trait RecordSource {
    /// Every sample of the cohort, including samples without records.
    fn samples(&self) -> Vec<String>;

    fn genes(&self) -> Vec<String>;

    fn records<'a>(&'a self, filter: RecordFilter<'a>) -> Box<dyn Iterator<Item = &'a MutationRecord> + 'a>;

    /// Names of the additional per-record fields.
    fn fields(&self) -> Vec<String>;

    fn cohort_size(&self) -> usize {
        self.samples().len()
    }
}

/// In-memory record table
#[derive(Debug, Clone, Default)]
pub struct MafTable {
    records: Vec<MutationRecord>,
    samples: Vec<String>,
    genes: Vec<String>,
    fields: Vec<String>,
}

impl MafTable {
    pub fn new(records: Vec<MutationRecord>) -> Self {
        let mut table = MafTable::default();
        let mut seen_samples: FxHashSet<String> = FxHashSet::default();
        let mut seen_genes: FxHashSet<String> = FxHashSet::default();
        let mut seen_fields: FxHashSet<String> = FxHashSet::default();

        for record in &records {
            if seen_samples.insert(record.sample.clone()) {
                table.samples.push(record.sample.clone());
            }
            if seen_genes.insert(record.gene.clone()) {
                table.genes.push(record.gene.clone());
            }
        }
        // Field names are sorted so that diagnostics do not depend on hash order
        for record in &records {
            for name in record.fields.keys() {
                if seen_fields.insert(name.clone()) {
                    table.fields.push(name.clone());
                }
            }
        }
        table.fields.sort();
        table.records = records;
        table
    }

    /// Register cohort samples that carry no records at all.
    pub fn with_cohort<I, T>(mut self, samples: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut known: FxHashSet<String> = self.samples.iter().cloned().collect();
        for sample in samples {
            let sample = sample.into();
            if known.insert(sample.clone()) {
                self.samples.push(sample);
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Parse a tab-separated MAF-like table.
    ///
    /// Required columns are `Tumor_Sample_Barcode`, `Hugo_Symbol` and
    /// `Variant_Classification`. `Copy_Number`, `Reference_Allele` and
    /// `Tumor_Seq_Allele2` are picked up when present; every other column is
    /// kept as an additional field. Lines starting with `#` are skipped.
    pub fn from_tsv_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut header: Option<(Vec<String>, ColumnLayout)> = None;
        let mut records = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let parts: Vec<&str> = line.split('\t').collect();

            let (columns, layout) = match header.as_ref() {
                Some(h) => h,
                None => {
                    let columns: Vec<String> = parts.iter().map(|s| s.trim().to_string()).collect();
                    let layout = ColumnLayout::from_header(&columns, line_no + 1)?;
                    header = Some((columns, layout));
                    continue;
                }
            };

            if parts.len() != columns.len() {
                return Err(OncoError::Parse {
                    line: line_no + 1,
                    reason: format!("expected {} columns, found {}", columns.len(), parts.len()),
                });
            }

            let optional = |idx: Option<usize>| {
                idx.map(|i| parts[i].trim())
                    .filter(|v| !v.is_empty() && *v != "NA")
                    .map(str::to_string)
            };

            let fields = columns
                .iter()
                .enumerate()
                .filter(|(i, _)| !layout.is_core(*i))
                .map(|(i, name)| (name.clone(), parts[i].trim().to_string()))
                .collect();

            records.push(MutationRecord {
                sample: parts[layout.sample].trim().to_string(),
                gene: parts[layout.gene].trim().to_string(),
                category: parts[layout.category].trim().to_string(),
                copy_number: optional(layout.copy_number),
                ref_allele: optional(layout.ref_allele),
                alt_allele: optional(layout.alt_allele),
                fields,
            });
        }

        let Some((columns, layout)) = header else {
            return Err(OncoError::Parse { line: 0, reason: "empty input".to_string() });
        };

        let mut table = MafTable::new(records);
        // Columns that are empty in every record are still valid fields
        for (i, name) in columns.iter().enumerate() {
            if !layout.is_core(i) && !table.fields.contains(name) {
                table.fields.push(name.clone());
            }
        }
        table.fields.sort();

        debug!("Record fields: {:?}", table.fields);
        Ok(table)
    }

    pub fn from_tsv_path(path: &Path) -> Result<Self> {
        info!("Loading records from {:?}...", path);
        let file = File::open(path)?;
        let table = Self::from_tsv_reader(BufReader::new(file))?;
        info!(
            "Found {} records, {} samples, {} genes",
            table.records.len(),
            table.samples.len(),
            table.genes.len()
        );
        Ok(table)
    }
}

/// Positions of the recognised columns in a record table header
#[derive(Debug, Clone, Copy)]
struct ColumnLayout {
    sample: usize,
    gene: usize,
    category: usize,
    copy_number: Option<usize>,
    ref_allele: Option<usize>,
    alt_allele: Option<usize>,
}

impl ColumnLayout {
    fn from_header(columns: &[String], line: usize) -> Result<Self> {
        let find = |name: &str| columns.iter().position(|c| c == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| OncoError::Parse {
                line,
                reason: format!("missing required column '{}'", name),
            })
        };
        Ok(ColumnLayout {
            sample: require(SAMPLE_COLUMN)?,
            gene: require(GENE_COLUMN)?,
            category: require(CATEGORY_COLUMN)?,
            copy_number: find(COPY_NUMBER_COLUMN),
            ref_allele: find(REF_COLUMN),
            alt_allele: find(ALT_COLUMN),
        })
    }

    fn is_core(&self, i: usize) -> bool {
        i == self.sample
            || i == self.gene
            || i == self.category
            || Some(i) == self.copy_number
            || Some(i) == self.ref_allele
            || Some(i) == self.alt_allele
    }
}

impl RecordSource for MafTable {
    fn samples(&self) -> Vec<String> {
        self.samples.clone()
    }

    fn genes(&self) -> Vec<String> {
        self.genes.clone()
    }

    fn records<'a>(&'a self, filter: RecordFilter<'a>) -> Box<dyn Iterator<Item = &'a MutationRecord> + 'a> {
        Box::new(self.records.iter().filter(move |r| filter.accepts(r)))
    }

    fn fields(&self) -> Vec<String> {
        self.fields.clone()
    }
}

/// Read a plain list (one entry per line), as used for gene and sample orders.
pub fn load_list(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() && !line.starts_with('#') {
            entries.push(line.to_string());
        }
    }

    Ok(entries)
}

/// Read `key<TAB>value` pairs, skipping blank and `#` lines.
pub fn load_pairs(path: &Path) -> Result<Vec<(String, String)>> {
    Ok(load_numbered_pairs(path)?
        .into_iter()
        .map(|(_, key, value)| (key, value))
        .collect())
}

/// Like [`load_pairs`], keeping the 1-based file line of every pair.
pub fn load_numbered_pairs(path: &Path) -> Result<Vec<(usize, String, String)>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut pairs = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(2, '\t');
        match (parts.next(), parts.next()) {
            (Some(key), Some(value)) => {
                pairs.push((line_no + 1, key.trim().to_string(), value.trim().to_string()))
            }
            _ => {
                return Err(OncoError::Parse {
                    line: line_no + 1,
                    reason: "expected two tab-separated columns".to_string(),
                })
            }
        }
    }

    Ok(pairs)
}

/// Read `gene<TAB>number` lines, as used for the expression track.
pub fn load_gene_values(path: &Path) -> Result<FxHashMap<String, f64>> {
    let mut values = FxHashMap::default();
    for (line, gene, raw) in load_numbered_pairs(path)? {
        let value: f64 = raw.parse().map_err(|_| OncoError::Parse {
            line,
            reason: format!("invalid value '{}' for gene {}", raw, gene),
        })?;
        values.insert(gene, value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    const MAF: &str = "\
#version 2.4
Hugo_Symbol\tTumor_Sample_Barcode\tVariant_Classification\tReference_Allele\tTumor_Seq_Allele2\tHGVSp
TP53\tS1\tMissense_Mutation\tC\tT\tp.R175H
KRAS\tS2\tMissense_Mutation\tG\tT\tp.G12V
TP53\tS2\tNonsense_Mutation\tC\tA\t
";

    #[test]
    fn parses_core_and_extra_columns() {
        let table = MafTable::from_tsv_reader(Cursor::new(MAF)).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.samples(), vec!["S1", "S2"]);
        assert_eq!(table.genes(), vec!["TP53", "KRAS"]);
        assert_eq!(table.fields(), vec!["HGVSp"]);

        let first = table.records(RecordFilter::default()).next().unwrap();
        assert_eq!(first.ref_allele.as_deref(), Some("C"));
        assert_eq!(first.fields.get("HGVSp").map(String::as_str), Some("p.R175H"));
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let err = MafTable::from_tsv_reader(Cursor::new("Hugo_Symbol\tVariant_Classification\n")).unwrap_err();
        assert!(matches!(err, OncoError::Parse { line: 1, .. }));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let input = "Hugo_Symbol\tTumor_Sample_Barcode\tVariant_Classification\nTP53\tS1\n";
        assert!(MafTable::from_tsv_reader(Cursor::new(input)).is_err());
    }

    #[test]
    fn filter_restricts_genes_and_samples() {
        let table = MafTable::from_tsv_reader(Cursor::new(MAF)).unwrap();
        let genes: FxHashSet<String> = ["TP53".to_string()].into_iter().collect();
        let samples: FxHashSet<String> = ["S2".to_string()].into_iter().collect();
        let filter = RecordFilter { genes: Some(&genes), samples: Some(&samples) };
        let hits: Vec<_> = table.records(filter).map(|r| r.category.as_str()).collect();
        assert_eq!(hits, vec!["Nonsense_Mutation"]);
    }

    #[test]
    fn cohort_extends_samples_without_duplicates() {
        let table = MafTable::new(vec![MutationRecord::new("S1", "TP53", "Silent")])
            .with_cohort(["S1", "S9"]);
        assert_eq!(table.samples(), vec!["S1", "S9"]);
        assert_eq!(table.cohort_size(), 2);
    }

    #[test]
    fn loads_lists_and_pairs_from_files() {
        let mut list = tempfile::NamedTempFile::new().unwrap();
        writeln!(list, "TP53\n\n# comment\nKRAS").unwrap();
        assert_eq!(load_list(list.path()).unwrap(), vec!["TP53", "KRAS"]);

        let mut pairs = tempfile::NamedTempFile::new().unwrap();
        writeln!(pairs, "Missense_Mutation\t#FF0000").unwrap();
        assert_eq!(
            load_pairs(pairs.path()).unwrap(),
            vec![("Missense_Mutation".to_string(), "#FF0000".to_string())]
        );
    }

    #[test]
    fn value_errors_report_the_file_line() {
        let mut values = tempfile::NamedTempFile::new().unwrap();
        writeln!(values, "# gene\tlog2fc\n\nTP53\t1.5\nKRAS\thigh").unwrap();
        match load_gene_values(values.path()).unwrap_err() {
            OncoError::Parse { line, reason } => {
                assert_eq!(line, 4);
                assert!(reason.contains("KRAS"));
            }
            other => panic!("unexpected error {:?}", other),
        }

        let mut good = tempfile::NamedTempFile::new().unwrap();
        writeln!(good, "\nTP53\t1.5").unwrap();
        assert_eq!(load_numbered_pairs(good.path()).unwrap(), vec![(2, "TP53".to_string(), "1.5".to_string())]);
        assert_eq!(load_gene_values(good.path()).unwrap().get("TP53"), Some(&1.5));
    }
}
