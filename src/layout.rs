//! Panel composition of the figure.
//!
//! The plan is a grid of three columns (left track, matrix, right bar) and a
//! variable number of rows. Composition rules:
//! - the column bar sits above the matrix;
//! - the expression track and the row bar flank the matrix in its row;
//! - the annotation track renders directly below the matrix, the TiTv track
//!   below that, then sample labels;
//! - the legend is always last and spans the full width.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutFlags {
    pub row_bar: bool,
    pub column_bar: bool,
    pub titv: bool,
    pub expression: bool,
    /// Number of annotation features; zero disables the track
    pub annotation_tracks: usize,
    pub sample_labels: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    ColumnBar,
    ExpressionTrack,
    Matrix,
    RowBar,
    AnnotationTrack,
    TiTvTrack,
    SampleLabels,
    Legend,
}

/// Grid position; `span` counts grid columns from `column`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub row: usize,
    pub column: usize,
    pub span: usize,
}

/// Margins in text-line units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Margins { top, right, bottom, left }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelSpec {
    pub kind: PanelKind,
    pub slot: Slot,
    pub rel_height: f64,
    pub rel_width: f64,
    pub margins: Margins,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelPlan {
    /// Panels in drawing order
    pub panels: Vec<PanelSpec>,
    pub row_heights: Vec<f64>,
    pub column_widths: [f64; 3],
}

impl PanelPlan {
    pub fn kinds(&self) -> Vec<PanelKind> {
        self.panels.iter().map(|p| p.kind).collect()
    }

    pub fn get(&self, kind: PanelKind) -> Option<&PanelSpec> {
        self.panels.iter().find(|p| p.kind == kind)
    }
}

const LEFT: usize = 0;
const CENTER: usize = 1;
const RIGHT: usize = 2;

const COLUMN_BAR_HEIGHT: f64 = 2.0;
const MATRIX_HEIGHT: f64 = 8.0;
const ANNOTATION_HEIGHT_PER_TRACK: f64 = 0.5;
const TITV_HEIGHT: f64 = 2.5;
const SAMPLE_LABEL_HEIGHT: f64 = 1.5;
const LEGEND_HEIGHT: f64 = 1.5;

const SIDE_WIDTH: f64 = 1.0;
const MATRIX_WIDTH: f64 = 5.0;

/// Turn feature flags into the ordered panel plan.
pub fn plan_layout(flags: &LayoutFlags) -> PanelPlan {
    let mut panels = Vec::new();
    let mut row_heights = Vec::new();

    let column_widths = [
        if flags.expression { SIDE_WIDTH } else { 0.0 },
        MATRIX_WIDTH,
        if flags.row_bar { SIDE_WIDTH } else { 0.0 },
    ];
    // Gene names sit left of the matrix unless the expression track does
    let gene_name_margin = if flags.expression { 0.5 } else { 4.0 };
    let bar_margin = if flags.row_bar { 0.5 } else { 4.0 };

    let mut add_row = |height: f64| {
        row_heights.push(height);
        row_heights.len() - 1
    };
    let center = |row: usize| Slot { row, column: CENTER, span: 1 };

    if flags.column_bar {
        let row = add_row(COLUMN_BAR_HEIGHT);
        panels.push(PanelSpec {
            kind: PanelKind::ColumnBar,
            slot: center(row),
            rel_height: COLUMN_BAR_HEIGHT,
            rel_width: MATRIX_WIDTH,
            margins: Margins::new(1.0, bar_margin, 0.0, gene_name_margin),
        });
    }

    let matrix_row = add_row(MATRIX_HEIGHT);
    if flags.expression {
        panels.push(PanelSpec {
            kind: PanelKind::ExpressionTrack,
            slot: Slot { row: matrix_row, column: LEFT, span: 1 },
            rel_height: MATRIX_HEIGHT,
            rel_width: SIDE_WIDTH,
            margins: Margins::new(0.0, 4.0, 0.0, 0.5),
        });
    }
    panels.push(PanelSpec {
        kind: PanelKind::Matrix,
        slot: center(matrix_row),
        rel_height: MATRIX_HEIGHT,
        rel_width: MATRIX_WIDTH,
        margins: Margins::new(0.0, bar_margin, 0.0, gene_name_margin),
    });
    if flags.row_bar {
        panels.push(PanelSpec {
            kind: PanelKind::RowBar,
            slot: Slot { row: matrix_row, column: RIGHT, span: 1 },
            rel_height: MATRIX_HEIGHT,
            rel_width: SIDE_WIDTH,
            margins: Margins::new(0.0, 0.5, 0.0, 2.0),
        });
    }

    if flags.annotation_tracks > 0 {
        let height = ANNOTATION_HEIGHT_PER_TRACK * flags.annotation_tracks as f64;
        let row = add_row(height);
        panels.push(PanelSpec {
            kind: PanelKind::AnnotationTrack,
            slot: center(row),
            rel_height: height,
            rel_width: MATRIX_WIDTH,
            margins: Margins::new(0.2, bar_margin, 0.0, gene_name_margin),
        });
    }

    if flags.titv {
        let row = add_row(TITV_HEIGHT);
        panels.push(PanelSpec {
            kind: PanelKind::TiTvTrack,
            slot: center(row),
            rel_height: TITV_HEIGHT,
            rel_width: MATRIX_WIDTH,
            margins: Margins::new(0.5, bar_margin, 0.0, gene_name_margin),
        });
    }

    if flags.sample_labels {
        let row = add_row(SAMPLE_LABEL_HEIGHT);
        panels.push(PanelSpec {
            kind: PanelKind::SampleLabels,
            slot: center(row),
            rel_height: SAMPLE_LABEL_HEIGHT,
            rel_width: MATRIX_WIDTH,
            margins: Margins::new(0.2, bar_margin, 0.0, gene_name_margin),
        });
    }

    let legend_row = add_row(LEGEND_HEIGHT);
    panels.push(PanelSpec {
        kind: PanelKind::Legend,
        slot: Slot { row: legend_row, column: LEFT, span: 3 },
        rel_height: LEGEND_HEIGHT,
        rel_width: column_widths.iter().sum(),
        margins: Margins::new(0.5, 0.5, 0.5, 0.5),
    });

    PanelPlan { panels, row_heights, column_widths }
}
