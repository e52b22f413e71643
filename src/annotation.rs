//! Clinical annotation table and its alignment to matrix columns.

use crate::colors::{is_missing_label, CategoricalEncoding, ColorAssigner, ColorTable, PaletteKind};
use crate::error::{OncoError, Result};
use log::{debug, info};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    Categorical(String),
    Numeric(f64),
    Missing,
}

impl AnnotationValue {
    /// Numbers become `Numeric`, `NA`/empty become `Missing`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if is_missing_label(raw) {
            return AnnotationValue::Missing;
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => AnnotationValue::Numeric(v),
            _ => AnnotationValue::Categorical(raw.to_string()),
        }
    }

    /// Text form used for grouping and legends
    pub fn label(&self) -> Option<String> {
        match self {
            AnnotationValue::Categorical(s) => Some(s.clone()),
            AnnotationValue::Numeric(v) => Some(v.to_string()),
            AnnotationValue::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, AnnotationValue::Missing)
    }
}

/// Per-sample clinical features
#[derive(Debug, Clone, Default)]
pub struct AnnotationTable {
    features: Vec<String>,
    rows: FxHashMap<String, FxHashMap<String, AnnotationValue>>,
}

impl AnnotationTable {
    pub fn new<I, T>(features: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        AnnotationTable {
            features: features.into_iter().map(Into::into).collect(),
            rows: FxHashMap::default(),
        }
    }

    /// Set one value; unknown features are registered on first use.
    pub fn insert(&mut self, sample: &str, feature: &str, value: AnnotationValue) {
        if !self.features.iter().any(|f| f == feature) {
            self.features.push(feature.to_string());
        }
        self.rows
            .entry(sample.to_string())
            .or_default()
            .insert(feature.to_string(), value);
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    pub fn has_sample(&self, sample: &str) -> bool {
        self.rows.contains_key(sample)
    }

    pub fn value(&self, sample: &str, feature: &str) -> &AnnotationValue {
        self.rows
            .get(sample)
            .and_then(|row| row.get(feature))
            .unwrap_or(&AnnotationValue::Missing)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fail unless the named feature exists.
    pub fn require_feature(&self, feature: &str) -> Result<()> {
        if self.has_feature(feature) {
            Ok(())
        } else {
            Err(OncoError::UnknownAnnotationFeature {
                feature: feature.to_string(),
                available: self.features.clone(),
            })
        }
    }

    /// Fail unless every sample has a row.
    pub fn require_samples(&self, samples: &[String]) -> Result<()> {
        let missing: Vec<String> = samples.iter().filter(|s| !self.has_sample(s)).cloned().collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(OncoError::MissingAnnotationRows { missing })
        }
    }

    /// Parse a tab-separated table with a header; `sample_column` names the
    /// column holding sample identifiers, all other columns are features.
    pub fn from_tsv_reader<R: BufRead>(reader: R, sample_column: &str) -> Result<Self> {
        let mut lines = reader
            .lines()
            .enumerate()
            .filter(|(_, l)| l.as_ref().map_or(true, |l| !l.trim().is_empty() && !l.starts_with('#')));

        let header: Vec<String> = match lines.next() {
            Some((_, line)) => line?.split('\t').map(|s| s.trim().to_string()).collect(),
            None => return Err(OncoError::Parse { line: 0, reason: "empty annotation table".to_string() }),
        };
        let sample_idx = header.iter().position(|h| h == sample_column).ok_or_else(|| OncoError::Parse {
            line: 1,
            reason: format!("missing sample column '{}'", sample_column),
        })?;

        let features: Vec<String> = header
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != sample_idx)
            .map(|(_, h)| h.clone())
            .collect();
        let mut table = AnnotationTable::new(features);

        for (line_no, line) in lines {
            let line = line?;
            let parts: Vec<&str> = line.split('\t').collect();
            if parts.len() != header.len() {
                return Err(OncoError::Parse {
                    line: line_no + 1,
                    reason: format!("expected {} columns, found {}", header.len(), parts.len()),
                });
            }
            let sample = parts[sample_idx].trim();
            if table.rows.contains_key(sample) {
                return Err(OncoError::Parse {
                    line: line_no + 1,
                    reason: format!("duplicate row for sample '{}'", sample),
                });
            }
            let row = table.rows.entry(sample.to_string()).or_default();
            for (i, raw) in parts.iter().enumerate() {
                if i != sample_idx {
                    row.insert(header[i].clone(), AnnotationValue::parse(raw));
                }
            }
        }

        debug!("Annotation features: {:?}", table.features);
        Ok(table)
    }

    pub fn from_tsv_path(path: &Path, sample_column: &str) -> Result<Self> {
        info!("Loading annotations from {:?}...", path);
        let file = File::open(path)?;
        let table = Self::from_tsv_reader(BufReader::new(file), sample_column)?;
        info!("Found {} annotated samples, {} features", table.len(), table.features.len());
        Ok(table)
    }
}

/// Drawable form of one feature, one entry per matrix column
#[derive(Debug, Clone, PartialEq)]
pub enum TrackValues {
    Categorical {
        encoding: CategoricalEncoding,
        /// Level index per column; `None` for missing
        indices: Vec<Option<usize>>,
        colors: ColorTable,
    },
    Numeric {
        values: Vec<Option<f64>>,
        min: f64,
        max: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationTrack {
    pub feature: String,
    pub values: TrackValues,
}

impl AnnotationTrack {
    pub fn len(&self) -> usize {
        match &self.values {
            TrackValues::Categorical { indices, .. } => indices.len(),
            TrackValues::Numeric { values, .. } => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Annotation rows in matrix column order
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedAnnotation {
    pub samples: Vec<String>,
    pub tracks: Vec<AnnotationTrack>,
}

/// Align annotation rows to `samples` and encode the requested features.
///
/// Every sample must be annotated; rows for other samples are ignored. A
/// feature is numeric when all of its present values are numbers.
pub fn align_annotation(
    table: &AnnotationTable,
    samples: &[String],
    features: &[String],
    colors: &ColorAssigner,
) -> Result<AlignedAnnotation> {
    table.require_samples(samples)?;
    for feature in features {
        table.require_feature(feature)?;
    }

    let mut tracks = Vec::with_capacity(features.len());
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for feature in features {
        if !seen.insert(feature.as_str()) {
            continue;
        }
        let column: Vec<&AnnotationValue> = samples.iter().map(|s| table.value(s, feature)).collect();
        let numeric = column.iter().any(|v| !v.is_missing())
            && column
                .iter()
                .all(|v| matches!(v, AnnotationValue::Numeric(_) | AnnotationValue::Missing));

        let values = if numeric {
            let values: Vec<Option<f64>> = column
                .iter()
                .map(|v| match v {
                    AnnotationValue::Numeric(x) => Some(*x),
                    _ => None,
                })
                .collect();
            let present = values.iter().flatten().copied();
            let min = present.clone().fold(f64::INFINITY, f64::min);
            let max = present.fold(f64::NEG_INFINITY, f64::max);
            TrackValues::Numeric { values, min, max }
        } else {
            let labels: Vec<Option<String>> = column.iter().map(|v| v.label()).collect();
            let encoding = CategoricalEncoding::from_labels(labels.iter().flatten().map(String::as_str));
            let indices = labels
                .iter()
                .map(|l| l.as_deref().and_then(|l| encoding.encode(l)))
                .collect();
            let colors = colors.assign(encoding.levels(), PaletteKind::Annotation);
            TrackValues::Categorical { encoding, indices, colors }
        };
        tracks.push(AnnotationTrack { feature: feature.clone(), values });
    }

    debug!("Aligned {} annotation track(s) to {} samples", tracks.len(), samples.len());
    Ok(AlignedAnnotation { samples: samples.to_vec(), tracks })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn table() -> AnnotationTable {
        let input = "\
Tumor_Sample_Barcode\tGroup\tAge
S1\tA\t61
S2\tB\t48
S3\tA\tNA
S9\tC\t70
";
        AnnotationTable::from_tsv_reader(Cursor::new(input), "Tumor_Sample_Barcode").unwrap()
    }

    #[test]
    fn parses_values_by_kind() {
        assert_eq!(AnnotationValue::parse("3.5"), AnnotationValue::Numeric(3.5));
        assert_eq!(AnnotationValue::parse(" NA "), AnnotationValue::Missing);
        assert_eq!(AnnotationValue::parse(""), AnnotationValue::Missing);
        assert_eq!(AnnotationValue::parse("Stage I"), AnnotationValue::Categorical("Stage I".to_string()));
    }

    #[test]
    fn aligns_rows_to_matrix_order_and_drops_extras() {
        let t = table();
        let aligned = align_annotation(
            &t,
            &names(&["S3", "S1", "S2"]),
            &names(&["Group", "Age"]),
            &ColorAssigner::default(),
        )
        .unwrap();
        assert_eq!(aligned.samples, names(&["S3", "S1", "S2"]));
        assert_eq!(aligned.tracks.len(), 2);

        match &aligned.tracks[0].values {
            TrackValues::Categorical { encoding, indices, colors } => {
                assert_eq!(encoding.levels(), &names(&["A", "B"])[..]);
                assert_eq!(indices, &vec![Some(0), Some(0), Some(1)]);
                assert_ne!(colors.get("A"), colors.get("B"));
            }
            other => panic!("expected categorical track, got {:?}", other),
        }
        match &aligned.tracks[1].values {
            TrackValues::Numeric { values, min, max } => {
                assert_eq!(values, &vec![None, Some(61.0), Some(48.0)]);
                assert_eq!((*min, *max), (48.0, 61.0));
            }
            other => panic!("expected numeric track, got {:?}", other),
        }
    }

    #[test]
    fn missing_matrix_column_is_fatal() {
        let err = align_annotation(&table(), &names(&["S1", "S4"]), &names(&["Group"]), &ColorAssigner::default())
            .unwrap_err();
        match err {
            OncoError::MissingAnnotationRows { missing } => assert_eq!(missing, names(&["S4"])),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn unknown_feature_is_fatal() {
        let err = align_annotation(&table(), &names(&["S1"]), &names(&["Stage"]), &ColorAssigner::default())
            .unwrap_err();
        assert!(matches!(err, OncoError::UnknownAnnotationFeature { .. }));
    }

    #[test]
    fn duplicate_sample_rows_are_rejected() {
        let input = "Tumor_Sample_Barcode\tGroup\nS1\tA\n# note\nS1\tB\n";
        match AnnotationTable::from_tsv_reader(Cursor::new(input), "Tumor_Sample_Barcode").unwrap_err() {
            OncoError::Parse { line, reason } => {
                assert_eq!(line, 4);
                assert!(reason.contains("S1"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn insert_registers_features() {
        let mut t = AnnotationTable::new(Vec::<String>::new());
        t.insert("S1", "Group", AnnotationValue::Categorical("A".to_string()));
        assert!(t.has_feature("Group"));
        assert_eq!(t.value("S1", "Group").label().as_deref(), Some("A"));
        assert!(t.value("S2", "Group").is_missing());
    }
}
