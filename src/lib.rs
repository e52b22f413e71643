//! Oncoplot preparation: builds a gene × sample alteration matrix from
//! mutation records, orders its rows and columns, assigns category colors,
//! aligns clinical annotations and plans the figure panels.
//!
//! [`prepare_oncoplot`] runs the whole flow and hands an [`OncoPlot`] to a
//! [`Renderer`].

pub mod annotation;
pub mod colors;
pub mod error;
pub mod layout;
pub mod matrix;
pub mod oncoplot;
pub mod records;
pub mod render;
pub mod sort;
pub mod tracks;

pub use annotation::{align_annotation, AlignedAnnotation, AnnotationTable, AnnotationValue};
pub use colors::{ColorAssigner, ColorTable, PaletteKind, Rgb};
pub use error::{OncoError, Result};
pub use layout::{plan_layout, LayoutFlags, PanelKind, PanelPlan, PanelSpec};
pub use matrix::{build_onco_matrix, read_matrix_tsv, write_matrix_tsv, Alteration, BuildOptions, GeneSelection, OncoMatrix};
pub use oncoplot::{prepare_oncoplot, OncoPlot, PlotOptions};
pub use records::{MafTable, MutationRecord, RecordSource};
pub use render::{render_oncoplot, render_png, render_svg, Frame, RenderContext, Renderer};
pub use sort::{sort_matrix, GeneOrder, SampleOrder, SortSpec};
