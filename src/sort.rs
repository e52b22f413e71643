//! Gene and sample ordering policies.
//!
//! Sorting only permutes (or, for an explicit sample list, selects) rows and
//! columns of an [`OncoMatrix`]; cell contents are never touched.

use crate::annotation::AnnotationTable;
use crate::error::{OncoError, Result};
use crate::matrix::OncoMatrix;
use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;

/// Default similarity above which two samples share a pattern block
pub const DEFAULT_PATTERN_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum GeneOrder {
    /// Descending altered-sample count, ties by gene identifier
    #[default]
    Frequency,
    /// Listed genes first; the rest by frequency when `sort_within` is set,
    /// otherwise in their current order
    Explicit { genes: Vec<String>, sort_within: bool },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SampleOrder {
    /// Staircase order following the gene order
    #[default]
    Frequency,
    /// Exactly these samples; unknown names are skipped
    Explicit(Vec<String>),
    /// Grouped by one annotation feature, staircase within groups
    Annotation {
        feature: String,
        level_order: Option<Vec<String>>,
        group_by_size: bool,
    },
    /// Co-occurrence blocks of similar alteration patterns
    Pattern { threshold: f64 },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SortSpec {
    pub genes: GeneOrder,
    pub samples: SampleOrder,
}

impl SortSpec {
    pub fn needs_annotation(&self) -> bool {
        matches!(self.samples, SampleOrder::Annotation { .. })
    }
}

/// Compare two genes by descending altered-sample count, then identifier.
fn cmp_gene_frequency(matrix: &OncoMatrix, a: usize, b: usize) -> Ordering {
    matrix
        .altered_samples(b)
        .cmp(&matrix.altered_samples(a))
        .then_with(|| matrix.genes()[a].cmp(&matrix.genes()[b]))
}

/// Row permutation for the frequency policy.
pub fn frequency_gene_order(matrix: &OncoMatrix) -> Vec<usize> {
    let mut order: Vec<usize> = (0..matrix.n_genes()).collect();
    order.sort_by(|&a, &b| cmp_gene_frequency(matrix, a, b));
    order
}

/// Column permutation producing the staircase pattern under the current row
/// order: for each gene in turn, altered samples come first. Remaining ties go
/// to the sample with more altered genes, then to the smaller identifier.
pub fn staircase_sample_order(matrix: &OncoMatrix) -> Vec<usize> {
    let n_genes = matrix.n_genes();
    let burden: Vec<usize> = (0..matrix.n_samples()).map(|s| matrix.altered_genes(s)).collect();

    let mut order: Vec<usize> = (0..matrix.n_samples()).collect();
    order.sort_by(|&a, &b| {
        for g in 0..n_genes {
            match (matrix.is_altered(g, a), matrix.is_altered(g, b)) {
                (true, false) => return Ordering::Less,
                (false, true) => return Ordering::Greater,
                _ => {}
            }
        }
        burden[b]
            .cmp(&burden[a])
            .then_with(|| matrix.samples()[a].cmp(&matrix.samples()[b]))
    });
    order
}

fn explicit_gene_order(matrix: &OncoMatrix, genes: &[String], sort_within: bool) -> Vec<usize> {
    let mut order = Vec::with_capacity(matrix.n_genes());
    let mut placed = vec![false; matrix.n_genes()];
    let mut unknown = Vec::new();

    for gene in genes {
        match matrix.gene_index(gene) {
            Some(i) if !placed[i] => {
                placed[i] = true;
                order.push(i);
            }
            Some(_) => {}
            None => unknown.push(gene.as_str()),
        }
    }
    if !unknown.is_empty() {
        warn!("Gene order lists {} gene(s) not in the matrix: {}", unknown.len(), unknown.join(", "));
    }

    let mut rest: Vec<usize> = (0..matrix.n_genes()).filter(|&i| !placed[i]).collect();
    if sort_within {
        rest.sort_by(|&a, &b| cmp_gene_frequency(matrix, a, b));
    }
    order.extend(rest);
    order
}

fn explicit_sample_selection(matrix: &OncoMatrix, samples: &[String]) -> Result<Vec<usize>> {
    let mut selection = Vec::with_capacity(samples.len());
    let mut placed: FxHashSet<usize> = FxHashSet::default();
    let mut unknown = Vec::new();

    for sample in samples {
        match matrix.sample_index(sample) {
            Some(i) => {
                if placed.insert(i) {
                    selection.push(i);
                }
            }
            None => unknown.push(sample.as_str()),
        }
    }
    if !unknown.is_empty() {
        warn!(
            "Sample order lists {} sample(s) not in the matrix: {}",
            unknown.len(),
            unknown.join(", ")
        );
    }
    if selection.is_empty() {
        return Err(OncoError::EmptySampleOrder { requested: samples.len() });
    }
    let dropped = matrix.n_samples() - selection.len();
    if dropped > 0 {
        debug!("Sample order leaves out {} matrix sample(s)", dropped);
    }
    Ok(selection)
}

/// Group the staircase order by one annotation feature.
fn annotation_sample_order(
    matrix: &OncoMatrix,
    table: &AnnotationTable,
    feature: &str,
    level_order: Option<&[String]>,
    group_by_size: bool,
) -> Result<Vec<usize>> {
    table.require_feature(feature)?;
    table.require_samples(matrix.samples())?;

    let base = staircase_sample_order(matrix);

    // Groups in first-seen order over the staircase; missing values kept aside
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    let mut group_index: FxHashMap<String, usize> = FxHashMap::default();
    let mut missing = Vec::new();
    for &s in &base {
        match table.value(&matrix.samples()[s], feature).label() {
            Some(level) => {
                let gi = *group_index.entry(level.clone()).or_insert_with(|| {
                    groups.push((level, Vec::new()));
                    groups.len() - 1
                });
                groups[gi].1.push(s);
            }
            None => missing.push(s),
        }
    }

    if let Some(levels) = level_order {
        let rank: FxHashMap<&str, usize> = levels
            .iter()
            .enumerate()
            .rev()
            .map(|(i, l)| (l.as_str(), i))
            .collect();
        let unlisted: Vec<&str> = groups
            .iter()
            .map(|(l, _)| l.as_str())
            .filter(|l| !rank.contains_key(l))
            .collect();
        if !unlisted.is_empty() {
            debug!("Levels not in the explicit order are placed last: {}", unlisted.join(", "));
        }
        if group_by_size {
            debug!("Explicit level order takes precedence over group size");
        }
        // Stable sort keeps first-seen order among unlisted levels
        groups.sort_by_key(|(l, _)| rank.get(l.as_str()).copied().unwrap_or(usize::MAX));
    } else if group_by_size {
        groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    }

    let mut order: Vec<usize> = groups.into_iter().flat_map(|(_, members)| members).collect();
    order.extend(missing);
    Ok(order)
}

/// Union-find over sample indices
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, x: usize, y: usize) {
        let px = self.find(x);
        let py = self.find(y);
        if px == py {
            return;
        }
        match self.rank[px].cmp(&self.rank[py]) {
            Ordering::Less => self.parent[px] = py,
            Ordering::Greater => self.parent[py] = px,
            Ordering::Equal => {
                self.parent[py] = px;
                self.rank[px] += 1;
            }
        }
    }
}

/// Jaccard similarity of two sorted `(gene, code)` sets; two empty sets are
/// identical.
fn jaccard(a: &[(usize, u32)], b: &[(usize, u32)]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let (mut i, mut j, mut shared) = (0, 0, 0usize);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                shared += 1;
                i += 1;
                j += 1;
            }
        }
    }
    shared as f64 / (a.len() + b.len() - shared) as f64
}

/// Order samples so that similar alteration patterns form contiguous blocks.
///
/// Samples are linked when their `(gene, code)` sets reach `threshold`
/// Jaccard similarity. Blocks are emitted largest first; inside a block the
/// walk starts at the most altered sample and repeatedly moves to the most
/// similar unplaced one. All ties resolve to the frequency order.
pub fn pattern_sample_order(matrix: &OncoMatrix, threshold: f64) -> Vec<usize> {
    // Positions in `base` are the tie-breaking rank
    let base = staircase_sample_order(matrix);
    let n = base.len();
    if n == 0 {
        return base;
    }

    let patterns: Vec<Vec<(usize, u32)>> = base
        .iter()
        .map(|&s| {
            (0..matrix.n_genes())
                .filter_map(|g| {
                    let code = matrix.code(g, s);
                    (code != 0).then_some((g, code))
                })
                .collect()
        })
        .collect();

    let mut sim = vec![vec![1.0f64; n]; n];
    let mut uf = UnionFind::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            let s = jaccard(&patterns[i], &patterns[j]);
            sim[i][j] = s;
            sim[j][i] = s;
            if s >= threshold {
                uf.union(i, j);
            }
        }
    }

    // Blocks keyed by root, in order of their first member
    let mut block_of_root: FxHashMap<usize, usize> = FxHashMap::default();
    let mut blocks: Vec<Vec<usize>> = Vec::new();
    for i in 0..n {
        let root = uf.find(i);
        let b = *block_of_root.entry(root).or_insert_with(|| {
            blocks.push(Vec::new());
            blocks.len() - 1
        });
        blocks[b].push(i);
    }
    blocks.sort_by(|a, b| b.len().cmp(&a.len()));
    debug!("Pattern sort: {} block(s) over {} samples at threshold {:.2}", blocks.len(), n, threshold);

    let mut order = Vec::with_capacity(n);
    for members in &blocks {
        let mut placed = vec![false; members.len()];

        // Most altered member; max_by_key keeps the last maximum, so scan reversed
        let start = (0..members.len())
            .rev()
            .max_by_key(|&k| patterns[members[k]].len())
            .unwrap_or(0);
        placed[start] = true;
        order.push(base[members[start]]);
        let mut current = members[start];

        for _ in 1..members.len() {
            let mut best: Option<(usize, f64)> = None;
            for (k, &candidate) in members.iter().enumerate() {
                if placed[k] {
                    continue;
                }
                let s = sim[current][candidate];
                if best.map_or(true, |(_, best_sim)| s > best_sim) {
                    best = Some((k, s));
                }
            }
            let Some((k, _)) = best else { break };
            placed[k] = true;
            order.push(base[members[k]]);
            current = members[k];
        }
    }

    order
}

/// Apply gene and sample ordering to the matrix.
///
/// Genes are ordered first; sample policies then follow the new row order.
/// `annotation` is required for [`SampleOrder::Annotation`].
pub fn sort_matrix(matrix: &mut OncoMatrix, spec: &SortSpec, annotation: Option<&AnnotationTable>) -> Result<()> {
    let gene_order = match &spec.genes {
        GeneOrder::Frequency => frequency_gene_order(matrix),
        GeneOrder::Explicit { genes, sort_within } => explicit_gene_order(matrix, genes, *sort_within),
    };
    matrix.reorder_genes(&gene_order)?;

    match &spec.samples {
        SampleOrder::Frequency => {
            let order = staircase_sample_order(matrix);
            matrix.reorder_samples(&order)?;
        }
        SampleOrder::Explicit(samples) => {
            let selection = explicit_sample_selection(matrix, samples)?;
            matrix.select_samples(&selection)?;
        }
        SampleOrder::Annotation { feature, level_order, group_by_size } => {
            let table = annotation.ok_or_else(|| OncoError::UnknownAnnotationFeature {
                feature: feature.clone(),
                available: Vec::new(),
            })?;
            let order = annotation_sample_order(matrix, table, feature, level_order.as_deref(), *group_by_size)?;
            matrix.reorder_samples(&order)?;
        }
        SampleOrder::Pattern { threshold } => {
            let order = pattern_sample_order(matrix, *threshold);
            matrix.reorder_samples(&order)?;
        }
    }

    debug!("Sorted matrix: genes {:?}", matrix.genes());
    Ok(())
}
