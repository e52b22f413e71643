//! Drawing of a prepared [`OncoPlot`].
//!
//! Renderers receive an explicit [`RenderContext`] with every draw call; there
//! is no device state shared between panels. [`PanelPainter`] turns panels into
//! primitive shapes on a [`Canvas`], of which an SVG and an RGB raster version
//! are provided.

use crate::annotation::TrackValues;
use crate::colors::{Rgb, BACKGROUND_COLOR, NA_COLOR};
use crate::error::Result;
use crate::layout::{Margins, PanelKind, PanelPlan, PanelSpec};
use crate::oncoplot::OncoPlot;
use crate::tracks::SnvClass;
use image::RgbImage;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect { x, y, width, height }
    }

    /// Shrink by margins given in text lines; never below zero size.
    pub fn inset(&self, margins: &Margins, line: f64) -> Rect {
        let left = margins.left * line;
        let top = margins.top * line;
        Rect {
            x: self.x + left,
            y: self.y + top,
            width: (self.width - left - margins.right * line).max(0.0),
            height: (self.height - top - margins.bottom * line).max(0.0),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Cell `(row, column)` of an even `rows` × `columns` grid
    pub fn cell(&self, rows: usize, columns: usize, row: usize, column: usize) -> Rect {
        let w = self.width / columns.max(1) as f64;
        let h = self.height / rows.max(1) as f64;
        Rect::new(self.x + column as f64 * w, self.y + row as f64 * h, w, h)
    }

    fn shrink(&self, fraction: f64) -> Rect {
        let dx = self.width * fraction / 2.0;
        let dy = self.height * fraction / 2.0;
        Rect::new(self.x + dx, self.y + dy, self.width - 2.0 * dx, self.height - 2.0 * dy)
    }
}

/// Output size in pixels and the height of one text line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    pub line_height: f64,
}

impl Frame {
    pub fn new(width: u32, height: u32) -> Self {
        Frame {
            width: width as f64,
            height: height as f64,
            line_height: (height as f64 / 60.0).clamp(6.0, 14.0),
        }
    }
}

/// A panel with its resolved drawing area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedPanel {
    pub spec: PanelSpec,
    /// Grid cell occupied by the panel
    pub outer: Rect,
    /// Drawing area after margins
    pub inner: Rect,
}

/// Turn relative grid sizes into pixel rectangles.
pub fn resolve_panels(plan: &PanelPlan, frame: &Frame) -> Vec<PlacedPanel> {
    let total_height: f64 = plan.row_heights.iter().sum();
    let total_width: f64 = plan.column_widths.iter().sum();
    let y_scale = if total_height > 0.0 { frame.height / total_height } else { 0.0 };
    let x_scale = if total_width > 0.0 { frame.width / total_width } else { 0.0 };

    let mut row_offsets = Vec::with_capacity(plan.row_heights.len());
    let mut y = 0.0;
    for h in &plan.row_heights {
        row_offsets.push(y);
        y += h * y_scale;
    }
    let mut column_offsets = [0.0; 3];
    let mut x = 0.0;
    for (i, w) in plan.column_widths.iter().enumerate() {
        column_offsets[i] = x;
        x += w * x_scale;
    }

    plan.panels
        .iter()
        .map(|spec| {
            let slot = spec.slot;
            let last = (slot.column + slot.span).min(plan.column_widths.len());
            let width: f64 = plan.column_widths[slot.column..last].iter().sum::<f64>() * x_scale;
            let outer = Rect::new(
                column_offsets[slot.column],
                row_offsets[slot.row],
                width,
                plan.row_heights[slot.row] * y_scale,
            );
            let inner = outer.inset(&spec.margins, frame.line_height);
            PlacedPanel { spec: *spec, outer, inner }
        })
        .collect()
}

/// Everything a renderer may look at while drawing
pub struct RenderContext<'a> {
    pub plot: &'a OncoPlot,
    pub frame: Frame,
    pub panels: &'a [PlacedPanel],
}

impl RenderContext<'_> {
    pub fn placed(&self, kind: PanelKind) -> Option<&PlacedPanel> {
        self.panels.iter().find(|p| p.spec.kind == kind)
    }
}

pub trait Renderer {
    fn draw_panel(&mut self, panel: &PanelSpec, ctx: &RenderContext) -> Result<()>;

    fn finish(&mut self, _ctx: &RenderContext) -> Result<()> {
        Ok(())
    }
}

/// Draw every planned panel in plan order.
pub fn render_oncoplot<R: Renderer + ?Sized>(plot: &OncoPlot, frame: Frame, renderer: &mut R) -> Result<()> {
    let panels = resolve_panels(&plot.plan, &frame);
    let ctx = RenderContext { plot, frame, panels: &panels };
    for panel in &plot.plan.panels {
        debug!("Drawing {:?}", panel.kind);
        renderer.draw_panel(panel, &ctx)?;
    }
    renderer.finish(&ctx)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f64,
    pub anchor: Anchor,
    /// Rotate 90° counter-clockwise around the anchor point
    pub vertical: bool,
}

/// Primitive drawing surface
pub trait Canvas {
    fn fill_rect(&mut self, rect: Rect, color: Rgb);
    fn outline_rect(&mut self, rect: Rect, color: Rgb);
    fn text(&mut self, x: f64, y: f64, text: &str, style: TextStyle);
}

/// Escape special XML characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub struct SvgCanvas {
    svg: String,
}

impl SvgCanvas {
    pub fn new(frame: &Frame) -> Self {
        let mut svg = String::new();
        svg.push_str(&format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
  text {{ font-family: 'DejaVu Sans', Arial, sans-serif; }}
</style>
<rect width="100%" height="100%" fill="white"/>
"#,
            frame.width, frame.height, frame.width, frame.height
        ));
        SvgCanvas { svg }
    }

    pub fn into_svg(mut self) -> String {
        self.svg.push_str("</svg>\n");
        self.svg
    }
}

impl Canvas for SvgCanvas {
    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.svg.push_str(&format!(
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="rgb({},{},{})"/>"#,
            rect.x, rect.y, rect.width, rect.height, color.0, color.1, color.2
        ));
        self.svg.push('\n');
    }

    fn outline_rect(&mut self, rect: Rect, color: Rgb) {
        self.svg.push_str(&format!(
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="rgb({},{},{})"/>"#,
            rect.x, rect.y, rect.width, rect.height, color.0, color.1, color.2
        ));
        self.svg.push('\n');
    }

    fn text(&mut self, x: f64, y: f64, text: &str, style: TextStyle) {
        let anchor = match style.anchor {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        };
        let transform = if style.vertical {
            format!(r#" transform="rotate(-90 {:.2} {:.2})""#, x, y)
        } else {
            String::new()
        };
        self.svg.push_str(&format!(
            r#"<text x="{:.2}" y="{:.2}" font-size="{:.1}" text-anchor="{}"{}>{}</text>"#,
            x,
            y,
            style.size,
            anchor,
            transform,
            escape_xml(text)
        ));
        self.svg.push('\n');
    }
}

/// RGB raster; text is not rasterised
pub struct RasterCanvas {
    image: RgbImage,
}

impl RasterCanvas {
    pub fn new(frame: &Frame) -> Self {
        let width = frame.width.max(1.0) as u32;
        let height = frame.height.max(1.0) as u32;
        RasterCanvas { image: RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255])) }
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Pixel span `[start, end)` covered by a coordinate range
    fn span(start: f64, len: f64, limit: u32) -> (u32, u32) {
        let clamp = |v: f64| v.round().clamp(0.0, limit as f64) as u32;
        (clamp(start), clamp(start + len))
    }
}

impl Canvas for RasterCanvas {
    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        let (x0, x1) = Self::span(rect.x, rect.width, self.image.width());
        let (y0, y1) = Self::span(rect.y, rect.height, self.image.height());
        let pixel = image::Rgb([color.0, color.1, color.2]);
        for y in y0..y1 {
            for x in x0..x1 {
                self.image.put_pixel(x, y, pixel);
            }
        }
    }

    fn outline_rect(&mut self, rect: Rect, color: Rgb) {
        let edges = [
            Rect::new(rect.x, rect.y, rect.width, 1.0),
            Rect::new(rect.x, rect.bottom() - 1.0, rect.width, 1.0),
            Rect::new(rect.x, rect.y, 1.0, rect.height),
            Rect::new(rect.right() - 1.0, rect.y, 1.0, rect.height),
        ];
        for edge in edges {
            self.fill_rect(edge, color);
        }
    }

    fn text(&mut self, _x: f64, _y: f64, _text: &str, _style: TextStyle) {}
}

const TEXT_COLOR: Rgb = Rgb(0, 0, 0);
const HIGHLIGHT_COLOR: Rgb = Rgb(0, 0, 0);
const EXPRESSION_COLOR: Rgb = Rgb(69, 117, 180);
const NUMERIC_LOW: Rgb = Rgb(239, 243, 255);
const NUMERIC_HIGH: Rgb = Rgb(8, 81, 156);
/// Colors of the substitution classes, in [`SnvClass::ALL`] order
const TITV_COLORS: [Rgb; 6] = [
    Rgb(240, 228, 66),
    Rgb(0, 114, 178),
    Rgb(213, 94, 0),
    Rgb(0, 158, 115),
    Rgb(204, 121, 167),
    Rgb(86, 180, 233),
];

fn lerp_color(low: Rgb, high: Rgb, t: f64) -> Rgb {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    Rgb(mix(low.0, high.0), mix(low.1, high.1), mix(low.2, high.2))
}

/// Paints panels as rectangles and labels on a [`Canvas`]
pub struct PanelPainter<C: Canvas> {
    canvas: C,
}

impl<C: Canvas> PanelPainter<C> {
    pub fn new(canvas: C) -> Self {
        PanelPainter { canvas }
    }

    pub fn into_canvas(self) -> C {
        self.canvas
    }

    fn label(&self, ctx: &RenderContext, anchor: Anchor) -> TextStyle {
        TextStyle { size: ctx.frame.line_height * 0.8, anchor, vertical: false }
    }

    fn draw_matrix(&mut self, area: Rect, ctx: &RenderContext) {
        let plot = ctx.plot;
        let matrix = &plot.matrix;
        let (rows, columns) = (matrix.n_genes(), matrix.n_samples());
        let style = self.label(ctx, Anchor::End);

        for (g, gene) in matrix.genes().iter().enumerate() {
            for s in 0..columns {
                let cell = area.cell(rows, columns, g, s).shrink(0.1);
                self.canvas.fill_rect(cell, BACKGROUND_COLOR);
                if let Some(alt) = matrix.cell(g, s) {
                    self.canvas.fill_rect(cell, plot.colors.get(&alt.primary));
                    if let Some(secondary) = &alt.secondary {
                        let band = Rect::new(cell.x, cell.y + cell.height / 3.0, cell.width, cell.height / 3.0);
                        self.canvas.fill_rect(band, plot.colors.get(secondary));
                    }
                }
                if plot.is_highlighted(g, s) {
                    self.canvas.outline_rect(cell, HIGHLIGHT_COLOR);
                }
            }
            let row = area.cell(rows, 1, g, 0);
            self.canvas.text(area.x - 4.0, row.y + row.height * 0.7, gene, style);
        }
    }

    fn draw_stack(&mut self, cell: Rect, parts: &[(Rgb, f64)], scale: f64, horizontal: bool) {
        let mut offset = 0.0;
        for &(color, value) in parts {
            let size = value * scale;
            let rect = if horizontal {
                Rect::new(cell.x + offset, cell.y, size, cell.height)
            } else {
                Rect::new(cell.x, cell.bottom() - offset - size, cell.width, size)
            };
            self.canvas.fill_rect(rect, color);
            offset += size;
        }
    }

    fn draw_column_bar(&mut self, area: Rect, ctx: &RenderContext) {
        let Some(bar) = &ctx.plot.tracks.column_bar else { return };
        let max = bar.max_total().max(1) as f64;
        let columns = bar.counts.len();
        for (s, counts) in bar.counts.iter().enumerate() {
            let cell = area.cell(1, columns, 0, s).shrink(0.1);
            let parts: Vec<(Rgb, f64)> = counts.iter().map(|(l, n)| (ctx.plot.colors.get(l), *n as f64)).collect();
            self.draw_stack(cell, &parts, cell.height / max, false);
        }
        let style = self.label(ctx, Anchor::End);
        self.canvas.text(area.x - 4.0, area.y + style.size, &bar.max_total().to_string(), style);
    }

    fn draw_row_bar(&mut self, area: Rect, ctx: &RenderContext) {
        let Some(bar) = &ctx.plot.tracks.row_bar else { return };
        let max = bar.altered.iter().copied().max().unwrap_or(0).max(1) as f64;
        let rows = bar.counts.len();
        let style = self.label(ctx, Anchor::End);
        for (g, counts) in bar.counts.iter().enumerate() {
            let cell = area.cell(rows, 1, g, 0).shrink(0.2);
            let total: usize = counts.iter().map(|(_, n)| n).sum();
            // Stack lengths follow the altered-sample count, split by category share
            let unit = if total > 0 { bar.altered[g] as f64 / total as f64 } else { 0.0 };
            let parts: Vec<(Rgb, f64)> = counts
                .iter()
                .map(|(l, n)| (ctx.plot.colors.get(l), *n as f64 * unit))
                .collect();
            self.draw_stack(cell, &parts, cell.width / max, true);
            self.canvas.text(
                area.x - 2.0,
                cell.y + cell.height * 0.8,
                &format!("{:.0}%", bar.percent[g]),
                style,
            );
        }
    }

    fn draw_expression(&mut self, area: Rect, ctx: &RenderContext) {
        let Some(track) = &ctx.plot.tracks.expression else { return };
        let reach = track.min.abs().max(track.max.abs());
        let rows = track.values.len();
        for (g, value) in track.values.iter().enumerate() {
            let cell = area.cell(rows, 1, g, 0).shrink(0.2);
            let Some(v) = value else { continue };
            let width = if reach > 0.0 { cell.width * v.abs() / reach } else { 0.0 };
            self.canvas.fill_rect(Rect::new(cell.right() - width, cell.y, width, cell.height), EXPRESSION_COLOR);
        }
    }

    fn draw_annotation(&mut self, area: Rect, ctx: &RenderContext) {
        let Some(aligned) = &ctx.plot.annotation else { return };
        let rows = aligned.tracks.len();
        let columns = aligned.samples.len();
        let style = self.label(ctx, Anchor::End);
        for (t, track) in aligned.tracks.iter().enumerate() {
            for s in 0..columns {
                let cell = area.cell(rows, columns, t, s).shrink(0.1);
                let color = match &track.values {
                    TrackValues::Categorical { encoding, indices, colors } => indices[s]
                        .and_then(|i| encoding.decode(i))
                        .map_or(NA_COLOR, |level| colors.get(level)),
                    TrackValues::Numeric { values, min, max } => match values[s] {
                        Some(v) if max > min => lerp_color(NUMERIC_LOW, NUMERIC_HIGH, (v - min) / (max - min)),
                        Some(_) => NUMERIC_HIGH,
                        None => NA_COLOR,
                    },
                };
                self.canvas.fill_rect(cell, color);
            }
            let row = area.cell(rows, 1, t, 0);
            self.canvas.text(area.x - 4.0, row.y + row.height * 0.7, &track.feature, style);
        }
    }

    fn draw_titv(&mut self, area: Rect, ctx: &RenderContext) {
        let Some(titv) = &ctx.plot.tracks.titv else { return };
        let columns = titv.fractions.len();
        for (s, fractions) in titv.fractions.iter().enumerate() {
            let cell = area.cell(1, columns, 0, s).shrink(0.1);
            let parts: Vec<(Rgb, f64)> = TITV_COLORS.iter().copied().zip(fractions.iter().copied()).collect();
            self.draw_stack(cell, &parts, cell.height, false);
        }
    }

    fn draw_sample_labels(&mut self, area: Rect, ctx: &RenderContext) {
        let samples = ctx.plot.samples();
        let style = TextStyle { vertical: true, ..self.label(ctx, Anchor::End) };
        for (s, sample) in samples.iter().enumerate() {
            let cell = area.cell(1, samples.len(), 0, s);
            self.canvas.text(cell.x + cell.width * 0.7, area.y, sample, style);
        }
    }

    fn draw_legend(&mut self, area: Rect, ctx: &RenderContext) {
        let line = ctx.frame.line_height;
        let style = self.label(ctx, Anchor::Start);
        let mut entries: Vec<(String, Rgb)> = ctx.plot.colors.entries().to_vec();
        if ctx.plot.tracks.titv.is_some() {
            entries.extend(SnvClass::ALL.iter().zip(TITV_COLORS).map(|(c, rgb)| (c.label().to_string(), rgb)));
        }
        if let Some(aligned) = &ctx.plot.annotation {
            for track in &aligned.tracks {
                if let TrackValues::Categorical { colors, .. } = &track.values {
                    entries.extend(colors.entries().iter().map(|(l, c)| (format!("{}: {}", track.feature, l), *c)));
                }
            }
        }

        let (mut x, mut y) = (area.x, area.y);
        for (label, color) in entries {
            let width = line * 1.5 + label.len() as f64 * style.size * 0.6;
            if x + width > area.right() && x > area.x {
                x = area.x;
                y += line * 1.2;
            }
            self.canvas.fill_rect(Rect::new(x, y, line * 0.8, line * 0.8), color);
            self.canvas.text(x + line, y + line * 0.7, &label, style);
            x += width;
        }
    }
}

impl<C: Canvas> Renderer for PanelPainter<C> {
    fn draw_panel(&mut self, panel: &PanelSpec, ctx: &RenderContext) -> Result<()> {
        let Some(placed) = ctx.placed(panel.kind) else { return Ok(()) };
        let area = placed.inner;
        match panel.kind {
            PanelKind::ColumnBar => self.draw_column_bar(area, ctx),
            PanelKind::ExpressionTrack => self.draw_expression(area, ctx),
            PanelKind::Matrix => self.draw_matrix(area, ctx),
            PanelKind::RowBar => self.draw_row_bar(area, ctx),
            PanelKind::AnnotationTrack => self.draw_annotation(area, ctx),
            PanelKind::TiTvTrack => self.draw_titv(area, ctx),
            PanelKind::SampleLabels => self.draw_sample_labels(area, ctx),
            PanelKind::Legend => self.draw_legend(area, ctx),
        }
        Ok(())
    }
}

pub fn render_svg(plot: &OncoPlot, frame: Frame) -> Result<String> {
    let mut painter = PanelPainter::new(SvgCanvas::new(&frame));
    render_oncoplot(plot, frame, &mut painter)?;
    Ok(painter.into_canvas().into_svg())
}

pub fn render_png(plot: &OncoPlot, frame: Frame) -> Result<RgbImage> {
    let mut painter = PanelPainter::new(RasterCanvas::new(&frame));
    render_oncoplot(plot, frame, &mut painter)?;
    Ok(painter.into_canvas().into_image())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::GeneSelection;
    use crate::oncoplot::{prepare_oncoplot, PlotOptions};
    use crate::records::{MafTable, MutationRecord};

    fn plot() -> OncoPlot {
        let source = MafTable::new(vec![
            MutationRecord::new("S1", "TP53", "Missense_Mutation"),
            MutationRecord::new("S2", "TP53", "Nonsense_Mutation").with_copy_number("Del"),
            MutationRecord::new("S2", "KRAS", "Missense_Mutation"),
            MutationRecord::new("S3", "KRAS", "Frame_Shift_Ins"),
        ]);
        let options = PlotOptions {
            genes: GeneSelection::Explicit(vec!["TP53".to_string(), "KRAS".to_string()]),
            show_sample_names: true,
            ..PlotOptions::default()
        };
        prepare_oncoplot(&source, None, &options).unwrap()
    }

    struct Recorder(Vec<PanelKind>);

    impl Renderer for Recorder {
        fn draw_panel(&mut self, panel: &PanelSpec, _ctx: &RenderContext) -> Result<()> {
            self.0.push(panel.kind);
            Ok(())
        }
    }

    #[test]
    fn panels_are_drawn_in_plan_order() {
        let plot = plot();
        let mut recorder = Recorder(Vec::new());
        render_oncoplot(&plot, Frame::new(800, 600), &mut recorder).unwrap();
        assert_eq!(recorder.0, plot.plan.kinds());
    }

    #[test]
    fn panels_stack_inside_the_frame() {
        let plot = plot();
        let frame = Frame::new(800, 600);
        let panels = resolve_panels(&plot.plan, &frame);
        let find = |k| panels.iter().find(|p| p.spec.kind == k).unwrap();
        for p in &panels {
            assert!(p.outer.x >= 0.0 && p.outer.right() <= frame.width + 1e-6);
            assert!(p.outer.y >= 0.0 && p.outer.bottom() <= frame.height + 1e-6);
        }
        let bar = find(PanelKind::ColumnBar);
        let matrix = find(PanelKind::Matrix);
        let row_bar = find(PanelKind::RowBar);
        assert!(bar.outer.bottom() <= matrix.outer.y + 1e-6);
        assert_eq!(row_bar.outer.y, matrix.outer.y);
        assert!(row_bar.outer.x >= matrix.outer.right() - 1e-6);
        assert!((find(PanelKind::Legend).outer.width - frame.width).abs() < 1e-6);
    }

    #[test]
    fn svg_contains_labels_and_cell_colors() {
        let plot = plot();
        let svg = render_svg(&plot, Frame::new(800, 600)).unwrap();
        assert!(svg.starts_with("<?xml"));
        assert!(svg.ends_with("</svg>\n"));
        for name in ["TP53", "KRAS", "S1", "S2", "S3"] {
            assert!(svg.contains(&format!(">{}</text>", name)), "missing label {}", name);
        }
        let c = plot.colors.get("Nonsense_Mutation");
        assert!(svg.contains(&format!("fill=\"rgb({},{},{})\"", c.0, c.1, c.2)));
        let del = plot.colors.get("Del");
        assert!(svg.contains(&format!("fill=\"rgb({},{},{})\"", del.0, del.1, del.2)));
    }

    #[test]
    fn raster_paints_cells_with_category_colors() {
        let plot = plot();
        let frame = Frame::new(800, 600);
        let image = render_png(&plot, frame).unwrap();
        assert_eq!(image.dimensions(), (800, 600));

        let panels = resolve_panels(&plot.plan, &frame);
        let matrix = panels.iter().find(|p| p.spec.kind == PanelKind::Matrix).unwrap().inner;
        let (g, s) = (
            plot.matrix.gene_index("TP53").unwrap(),
            plot.matrix.sample_index("S1").unwrap(),
        );
        let cell = matrix.cell(plot.matrix.n_genes(), plot.matrix.n_samples(), g, s);
        let px = image.get_pixel((cell.x + cell.width / 2.0) as u32, (cell.y + cell.height / 2.0) as u32);
        let expected = plot.colors.get("Missense_Mutation");
        assert_eq!(px.0, [expected.0, expected.1, expected.2]);
    }

    #[test]
    fn xml_is_escaped() {
        assert_eq!(escape_xml("a<b & 'c'"), "a&lt;b &amp; &apos;c&apos;");
    }
}
