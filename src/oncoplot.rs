//! One-shot preparation of everything a renderer needs.

use crate::annotation::{align_annotation, AlignedAnnotation, AnnotationTable};
use crate::colors::{ColorAssigner, ColorTable, PaletteKind};
use crate::error::{OncoError, Result};
use crate::layout::{plan_layout, LayoutFlags, PanelPlan};
use crate::matrix::{build_onco_matrix, BuildOptions, GeneSelection, OncoMatrix};
use crate::records::RecordSource;
use crate::sort::{sort_matrix, SortSpec};
use crate::tracks::{
    column_bar, expression_track, highlight_cells, row_bar, titv_track, ColumnBar, ExpressionTrack, RowBar,
    TiTvTrack,
};
use log::info;
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone)]
pub struct PlotOptions {
    pub genes: GeneSelection,
    pub build: BuildOptions,
    pub sort: SortSpec,
    /// Annotation features drawn below the matrix, top to bottom
    pub annotation_features: Vec<String>,
    pub colors: ColorAssigner,
    pub draw_row_bar: bool,
    pub draw_column_bar: bool,
    pub draw_titv: bool,
    pub show_sample_names: bool,
    /// Per-gene values for the left-hand track
    pub expression: Option<FxHashMap<String, f64>>,
    /// Record field and value marking cells
    pub highlight: Option<(String, String)>,
}

impl Default for PlotOptions {
    fn default() -> Self {
        PlotOptions {
            genes: GeneSelection::default(),
            build: BuildOptions::default(),
            sort: SortSpec::default(),
            annotation_features: Vec::new(),
            colors: ColorAssigner::default(),
            draw_row_bar: true,
            draw_column_bar: true,
            draw_titv: false,
            show_sample_names: false,
            expression: None,
            highlight: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tracks {
    pub column_bar: Option<ColumnBar>,
    pub row_bar: Option<RowBar>,
    pub titv: Option<TiTvTrack>,
    pub expression: Option<ExpressionTrack>,
    /// Row-major cell mask
    pub highlight: Option<Vec<bool>>,
}

/// Sorted matrix with its colors, aligned annotation, tracks and panel plan
#[derive(Debug, Clone)]
pub struct OncoPlot {
    pub matrix: OncoMatrix,
    pub colors: ColorTable,
    pub annotation: Option<AlignedAnnotation>,
    pub tracks: Tracks,
    pub plan: PanelPlan,
}

impl OncoPlot {
    pub fn genes(&self) -> &[String] {
        self.matrix.genes()
    }

    pub fn samples(&self) -> &[String] {
        self.matrix.samples()
    }

    pub fn is_highlighted(&self, gene: usize, sample: usize) -> bool {
        self.tracks
            .highlight
            .as_ref()
            .map_or(false, |mask| mask[gene * self.matrix.n_samples() + sample])
    }
}

/// Build, sort, align and color the matrix and plan its panels.
///
/// Every fatal condition surfaces here, so a renderer only ever receives a
/// consistent plot.
pub fn prepare_oncoplot<S: RecordSource + ?Sized>(
    source: &S,
    annotation: Option<&AnnotationTable>,
    options: &PlotOptions,
) -> Result<OncoPlot> {
    if let Some((feature, _)) = &options.highlight {
        let available = source.fields();
        if !available.iter().any(|f| f == feature) {
            return Err(OncoError::AdditionalFeatureNotFound { feature: feature.clone(), available });
        }
    }
    if annotation.is_none() {
        if let Some(feature) = options.annotation_features.first() {
            return Err(OncoError::UnknownAnnotationFeature { feature: feature.clone(), available: Vec::new() });
        }
    }

    let mut matrix = build_onco_matrix(source, &options.genes, &options.build)?;
    sort_matrix(&mut matrix, &options.sort, annotation)?;
    matrix.check_parity()?;
    info!("Matrix: {} genes x {} samples", matrix.n_genes(), matrix.n_samples());

    let aligned = match annotation {
        Some(table) if !options.annotation_features.is_empty() => Some(align_annotation(
            table,
            matrix.samples(),
            &options.annotation_features,
            &options.colors,
        )?),
        _ => None,
    };

    let mut tracks = Tracks {
        row_bar: options.draw_row_bar.then(|| row_bar(&matrix)),
        titv: options.draw_titv.then(|| titv_track(source, matrix.samples())),
        expression: options.expression.as_ref().map(|values| expression_track(values, matrix.genes())),
        ..Tracks::default()
    };
    if options.draw_column_bar {
        tracks.column_bar = Some(column_bar(source, &matrix, &options.build.copy_number_labels));
    }
    if let Some((feature, value)) = &options.highlight {
        tracks.highlight = Some(highlight_cells(source, &matrix, feature, value)?);
    }

    // Column-bar categories from genes outside the matrix still need colors
    let mut labels = matrix.category_labels();
    if let Some(bar) = &tracks.column_bar {
        let mut known: FxHashSet<String> = labels.iter().cloned().collect();
        for (label, _) in bar.counts.iter().flatten() {
            if known.insert(label.clone()) {
                labels.push(label.clone());
            }
        }
    }
    let colors = options.colors.assign(&labels, PaletteKind::Alteration);

    let flags = LayoutFlags {
        row_bar: tracks.row_bar.is_some(),
        column_bar: tracks.column_bar.is_some(),
        titv: tracks.titv.is_some(),
        expression: tracks.expression.is_some(),
        annotation_tracks: aligned.as_ref().map_or(0, |a| a.tracks.len()),
        sample_labels: options.show_sample_names,
    };
    let plan = plan_layout(&flags);

    Ok(OncoPlot { matrix, colors, annotation: aligned, tracks, plan })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationValue;
    use crate::colors::{Rgb, NA_COLOR};
    use crate::layout::PanelKind;
    use crate::matrix::MULTI_HIT;
    use crate::records::{MafTable, MutationRecord};
    use crate::sort::SampleOrder;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn source() -> MafTable {
        MafTable::new(vec![
            MutationRecord::new("S1", "G1", "Missense_Mutation").with_field("Hotspot", "yes"),
            MutationRecord::new("S2", "G1", "Nonsense_Mutation"),
            MutationRecord::new("S2", "G1", "Missense_Mutation"),
            MutationRecord::new("S2", "G2", "Silent").with_alleles("C", "T"),
            MutationRecord::new("S3", "G3", "Amp"),
            MutationRecord::new("S3", "G9", "In_Frame_Del"),
        ])
    }

    fn annotation() -> AnnotationTable {
        let mut t = AnnotationTable::new(["Group"]);
        for (s, g) in [("S1", "B"), ("S2", "A"), ("S3", "A")] {
            t.insert(s, "Group", AnnotationValue::Categorical(g.to_string()));
        }
        t
    }

    fn explicit(genes: &[&str]) -> PlotOptions {
        PlotOptions { genes: GeneSelection::Explicit(names(genes)), ..PlotOptions::default() }
    }

    #[test]
    fn prepares_sorted_plot_with_default_panels() {
        let plot = prepare_oncoplot(&source(), None, &explicit(&["G2", "G1", "G3"])).unwrap();
        assert_eq!(plot.genes(), &names(&["G1", "G2", "G3"])[..]);
        assert_eq!(plot.samples(), &names(&["S2", "S1", "S3"])[..]);
        assert_eq!(plot.matrix.cell(0, 0).map(|a| a.label()), Some(MULTI_HIT.to_string()));
        assert_eq!(
            plot.plan.kinds(),
            vec![PanelKind::ColumnBar, PanelKind::Matrix, PanelKind::RowBar, PanelKind::Legend]
        );
        assert!(plot.matrix.check_parity().is_ok());
    }

    #[test]
    fn colors_cover_matrix_and_column_bar_categories() {
        let plot = prepare_oncoplot(&source(), None, &explicit(&["G1", "G2"])).unwrap();
        for label in [MULTI_HIT, "Missense_Mutation", "Silent", "Nonsense_Mutation"] {
            assert!(plot.colors.contains(label), "no color for {}", label);
        }
        assert_eq!(plot.colors.get("NA"), NA_COLOR);
    }

    #[test]
    fn overrides_flow_into_the_color_table() {
        let mut options = explicit(&["G1", "G2"]);
        options.colors = ColorAssigner::from_pairs(&[("Silent".to_string(), "#FF0000".to_string())]).unwrap();
        let plot = prepare_oncoplot(&source(), None, &options).unwrap();
        assert_eq!(plot.colors.get("Silent"), Rgb(255, 0, 0));
    }

    #[test]
    fn annotation_sort_and_alignment_share_column_order() {
        let table = annotation();
        let mut options = explicit(&["G1", "G2", "G3"]);
        options.sort.samples = SampleOrder::Annotation {
            feature: "Group".to_string(),
            level_order: None,
            group_by_size: true,
        };
        options.annotation_features = names(&["Group"]);
        let plot = prepare_oncoplot(&source(), Some(&table), &options).unwrap();

        let aligned = plot.annotation.as_ref().unwrap();
        assert_eq!(aligned.samples, plot.samples());
        assert_eq!(plot.samples(), &names(&["S2", "S3", "S1"])[..]);
        assert!(plot.plan.get(PanelKind::AnnotationTrack).is_some());
    }

    #[test]
    fn features_without_a_table_are_fatal() {
        let mut options = explicit(&["G1", "G2"]);
        options.annotation_features = names(&["Group"]);
        let err = prepare_oncoplot(&source(), None, &options).unwrap_err();
        assert!(matches!(err, OncoError::UnknownAnnotationFeature { .. }));
    }

    #[test]
    fn unknown_highlight_field_fails_before_building() {
        let mut options = explicit(&["G1"]);
        options.highlight = Some(("Cosmic".to_string(), "yes".to_string()));
        match prepare_oncoplot(&source(), None, &options).unwrap_err() {
            OncoError::AdditionalFeatureNotFound { feature, available } => {
                assert_eq!(feature, "Cosmic");
                assert_eq!(available, names(&["Hotspot"]));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn highlight_marks_matching_cells() {
        let mut options = explicit(&["G1", "G2"]);
        options.highlight = Some(("Hotspot".to_string(), "yes".to_string()));
        let plot = prepare_oncoplot(&source(), None, &options).unwrap();
        let s1 = plot.matrix.sample_index("S1").unwrap();
        assert!(plot.is_highlighted(0, s1));
        assert!(!plot.is_highlighted(1, s1));
    }

    #[test]
    fn optional_tracks_extend_the_plan() {
        let mut options = explicit(&["G1", "G2"]);
        options.draw_titv = true;
        options.show_sample_names = true;
        options.draw_row_bar = false;
        options.expression = Some([("G1".to_string(), 2.5)].into_iter().collect());
        let plot = prepare_oncoplot(&source(), None, &options).unwrap();
        assert_eq!(
            plot.plan.kinds(),
            vec![
                PanelKind::ColumnBar,
                PanelKind::ExpressionTrack,
                PanelKind::Matrix,
                PanelKind::TiTvTrack,
                PanelKind::SampleLabels,
                PanelKind::Legend,
            ]
        );
        let expression = plot.tracks.expression.as_ref().unwrap();
        assert_eq!(expression.values, vec![Some(2.5), None]);
        assert!(plot.tracks.row_bar.is_none());
    }
}
