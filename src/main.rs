use clap::Parser;
use log::{info, warn};
use oncolook::annotation::AnnotationTable;
use oncolook::colors::ColorAssigner;
use oncolook::error::{OncoError, Result};
use oncolook::matrix::{write_matrix_tsv, BuildOptions, GeneSelection};
use oncolook::oncoplot::{prepare_oncoplot, PlotOptions};
use oncolook::records::{load_gene_values, load_list, load_pairs, MafTable};
use oncolook::render::{render_png, render_svg, Frame};
use oncolook::sort::{GeneOrder, SampleOrder, SortSpec, DEFAULT_PATTERN_THRESHOLD};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "oncolook")]
#[command(about = "Draw an oncoplot from a table of somatic alterations.", long_about = None)]
struct Args {
    // MANDATORY OPTIONS
    /// Load mutation records from this tab-separated MAF-like FILE.
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    input: PathBuf,

    /// Write the oncoplot to this FILE (PNG or SVG based on extension).
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    out: PathBuf,

    // Gene Selection Options
    /// Draw the genes listed in FILE, one per line.
    #[arg(short = 'g', long = "genes", value_name = "FILE", conflicts_with = "top")]
    genes: Option<PathBuf>,

    /// Draw the N most frequently altered genes.
    #[arg(short = 't', long = "top", value_name = "N", default_value_t = 20)]
    top: usize,

    /// Keep requested genes without records and samples without alterations.
    #[arg(long = "add-missing")]
    add_missing: bool,

    // Ordering Options
    /// Order genes as listed in FILE.
    #[arg(long = "gene-order", value_name = "FILE")]
    gene_order: Option<PathBuf>,

    /// Sort genes missing from the gene order by frequency.
    #[arg(long = "sort-within", requires = "gene_order")]
    sort_within: bool,

    /// Draw only the samples listed in FILE, in that order.
    #[arg(long = "sample-order", value_name = "FILE", conflicts_with_all = ["sort_by_annotation", "sort_by_pattern"])]
    sample_order: Option<PathBuf>,

    /// Group samples by this annotation FEATURE.
    #[arg(long = "sort-by-annotation", value_name = "FEATURE", requires = "annotation", conflicts_with = "sort_by_pattern")]
    sort_by_annotation: Option<String>,

    /// Order annotation groups as listed in FILE.
    #[arg(long = "annotation-levels", value_name = "FILE", requires = "sort_by_annotation")]
    annotation_levels: Option<PathBuf>,

    /// Put larger annotation groups first.
    #[arg(long = "group-by-size", requires = "sort_by_annotation")]
    group_by_size: bool,

    /// Group samples with similar alteration patterns.
    #[arg(short = 'k', long = "sort-by-pattern")]
    sort_by_pattern: bool,

    /// Similarity above which samples share a pattern block.
    #[arg(long = "pattern-threshold", value_name = "F", requires = "sort_by_pattern", default_value_t = DEFAULT_PATTERN_THRESHOLD)]
    pattern_threshold: f64,

    // Annotation Options
    /// Load per-sample clinical annotations from this tab-separated FILE.
    #[arg(short = 'a', long = "annotation", value_name = "FILE")]
    annotation: Option<PathBuf>,

    /// Column of the annotation table holding sample identifiers.
    #[arg(long = "annotation-sample-column", value_name = "NAME", default_value = "Tumor_Sample_Barcode")]
    annotation_sample_column: String,

    /// Comma-separated annotation features to draw below the matrix.
    #[arg(short = 'f', long = "features", value_name = "LIST", value_delimiter = ',', requires = "annotation")]
    features: Vec<String>,

    // Visualization Options
    /// Read per-category colors from FILE (label, then #RRGGBB or r,g,b).
    #[arg(short = 'F', long = "colors", value_name = "FILE")]
    colors: Option<PathBuf>,

    /// Don't draw the per-gene bar on the right.
    #[arg(long = "no-row-bar")]
    no_row_bar: bool,

    /// Don't draw the per-sample bar on top.
    #[arg(long = "no-column-bar")]
    no_column_bar: bool,

    /// Draw transition/transversion fractions below the matrix.
    #[arg(long = "titv")]
    titv: bool,

    /// Read per-gene values for the left-hand track from FILE (gene, value).
    #[arg(long = "expression", value_name = "FILE")]
    expression: Option<PathBuf>,

    /// Outline cells with a record whose FIELD equals VALUE.
    #[arg(long = "highlight", value_name = "FIELD=VALUE")]
    highlight: Option<String>,

    /// Show sample names below the matrix.
    #[arg(short = 'S', long = "show-sample-names")]
    show_sample_names: bool,

    /// Set the width in pixels of the output image.
    #[arg(short = 'x', long = "width", value_name = "N", default_value_t = 1200)]
    width: u32,

    /// Set the height in pixels of the output image.
    #[arg(short = 'y', long = "height", value_name = "N", default_value_t = 800)]
    height: u32,

    // Output Options
    /// Also write the sorted alteration matrix to this tab-separated FILE.
    #[arg(long = "dump-matrix", value_name = "FILE")]
    dump_matrix: Option<PathBuf>,

    // General Options
    /// Number of threads to use.
    #[arg(long = "threads", value_name = "N", default_value_t = 1)]
    threads: usize,

    /// Verbosity level (0 = error, 1 = info, 2 = debug).
    #[arg(short = 'v', long = "verbose", default_value_t = 0)]
    verbose: u8,
}

fn plot_options(args: &Args) -> Result<PlotOptions> {
    let genes = match &args.genes {
        Some(path) => GeneSelection::Explicit(load_list(path)?),
        None => GeneSelection::Top(args.top),
    };

    let gene_order = match &args.gene_order {
        Some(path) => GeneOrder::Explicit { genes: load_list(path)?, sort_within: args.sort_within },
        None => GeneOrder::Frequency,
    };
    let sample_order = if let Some(path) = &args.sample_order {
        SampleOrder::Explicit(load_list(path)?)
    } else if let Some(feature) = &args.sort_by_annotation {
        SampleOrder::Annotation {
            feature: feature.clone(),
            level_order: args.annotation_levels.as_ref().map(|p| load_list(p)).transpose()?,
            group_by_size: args.group_by_size,
        }
    } else if args.sort_by_pattern {
        SampleOrder::Pattern { threshold: args.pattern_threshold }
    } else {
        SampleOrder::Frequency
    };

    let colors = match &args.colors {
        Some(path) => ColorAssigner::from_pairs(&load_pairs(path)?)?,
        None => ColorAssigner::default(),
    };

    let highlight = match &args.highlight {
        Some(spec) => match spec.split_once('=') {
            Some((field, value)) => Some((field.to_string(), value.to_string())),
            None => {
                return Err(OncoError::Parse {
                    line: 0,
                    reason: format!("highlight '{}' is not of the form FIELD=VALUE", spec),
                })
            }
        },
        None => None,
    };

    Ok(PlotOptions {
        genes,
        build: BuildOptions { add_missing: args.add_missing, ..BuildOptions::default() },
        sort: SortSpec { genes: gene_order, samples: sample_order },
        annotation_features: args.features.clone(),
        colors,
        draw_row_bar: !args.no_row_bar,
        draw_column_bar: !args.no_column_bar,
        draw_titv: args.titv,
        show_sample_names: args.show_sample_names,
        expression: args.expression.as_ref().map(|p| load_gene_values(p)).transpose()?,
        highlight,
    })
}

fn main() {
    let args = Args::parse();

    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    if args.threads > 1 {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(args.threads).build_global() {
            warn!("Could not configure {} threads: {}", args.threads, e);
        }
    }

    info!("Starting oncoplot...");

    let options = match plot_options(&args) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error reading options: {}", e);
            std::process::exit(1);
        }
    };

    let records = match MafTable::from_tsv_path(&args.input) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error loading records: {}", e);
            std::process::exit(1);
        }
    };

    if records.is_empty() {
        eprintln!("Warning: No records found in the input file.");
    }

    let annotation = match &args.annotation {
        Some(path) => match AnnotationTable::from_tsv_path(path, &args.annotation_sample_column) {
            Ok(t) => Some(t),
            Err(e) => {
                eprintln!("Error loading annotation: {}", e);
                std::process::exit(1);
            }
        },
        None => None,
    };

    let plot = match prepare_oncoplot(&records, annotation.as_ref(), &options) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(path) = &args.dump_matrix {
        info!("Writing matrix to {:?}...", path);
        let written = File::create(path).map_err(OncoError::from).and_then(|f| {
            let mut out = BufWriter::new(f);
            write_matrix_tsv(&plot.matrix, &mut out)?;
            out.flush()?;
            Ok(())
        });
        if let Err(e) = written {
            eprintln!("Error writing matrix: {}", e);
            std::process::exit(1);
        }
    }

    // Detect output format by file extension
    let is_svg = args.out.extension()
        .map(|ext| ext.to_ascii_lowercase() == "svg")
        .unwrap_or(false);
    let frame = Frame::new(args.width, args.height);

    if is_svg {
        info!("Rendering SVG...");
        let svg_content = match render_svg(&plot, frame) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error rendering SVG: {}", e);
                std::process::exit(1);
            }
        };

        info!("Saving to {:?}...", args.out);

        let mut file = match File::create(&args.out) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Error creating file: {}", e);
                std::process::exit(1);
            }
        };

        if let Err(e) = file.write_all(svg_content.as_bytes()) {
            eprintln!("Error writing SVG: {}", e);
            std::process::exit(1);
        }
    } else {
        info!("Rendering image...");
        let img = match render_png(&plot, frame) {
            Ok(i) => i,
            Err(e) => {
                eprintln!("Error rendering image: {}", e);
                std::process::exit(1);
            }
        };

        info!("Saving to {:?}...", args.out);

        if let Err(e) = img.save(&args.out) {
            eprintln!("Error saving image: {}", e);
            std::process::exit(1);
        }
    }

    info!("Done.");
}
