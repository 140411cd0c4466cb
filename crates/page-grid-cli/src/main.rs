use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSetBuilder};
use image::ImageFormat;
use page_grid_core::{
    Caption, InputImage, Layout, LayoutConfig, LayoutStats, Margins, PageGeometry, PageGridError,
    PageSize, PreviewOptions, embed_pdf_bytes, layout_images, parse_hex_color, render_preview,
};
use serde::Deserialize;
use tracing::{error, info};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "page-grid",
    about = "Lay out images with captions on a document page",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --no-progress or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute placements and export them as JSON
    Layout(LayoutArgs),
    /// Compute placements, export JSON and render a PNG preview
    Preview(LayoutArgs),
    /// Draw the images and captions onto a page of an existing PDF
    Embed(EmbedArgs),
    /// Simple timing bench (lays out once, prints grid, time + coverage)
    Bench(BenchArgs),
}

#[derive(Parser, Debug, Clone)]
struct LayoutArgs {
    // Input/Output
    /// Input file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Base name (files will be name.json/.png)
    #[arg(short, long, default_value = "layout", help_heading = "Input/Output")]
    name: String,
    /// YAML config file path (overrides page/margin/grid options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Page
    /// Page size: a3 | a4 | a5 | letter | legal
    #[arg(long, default_value = "a4", help_heading = "Page")]
    page: String,
    /// Swap page width and height
    #[arg(long, default_value_t = false, help_heading = "Page")]
    landscape: bool,
    /// Page width in points (overrides --page)
    #[arg(long, help_heading = "Page")]
    page_width: Option<f64>,
    /// Page height in points (overrides --page)
    #[arg(long, help_heading = "Page")]
    page_height: Option<f64>,
    /// Margin on all four sides (pt)
    #[arg(long, default_value_t = 20.0, help_heading = "Page")]
    margin: f64,
    /// Top margin (pt), overrides --margin
    #[arg(long, help_heading = "Page")]
    margin_top: Option<f64>,
    /// Bottom margin (pt), overrides --margin
    #[arg(long, help_heading = "Page")]
    margin_bottom: Option<f64>,
    /// Left margin (pt), overrides --margin
    #[arg(long, help_heading = "Page")]
    margin_left: Option<f64>,
    /// Right margin (pt), overrides --margin
    #[arg(long, help_heading = "Page")]
    margin_right: Option<f64>,

    // Grid
    /// Space between grid cells (pt)
    #[arg(long, default_value_t = 10.0, help_heading = "Grid")]
    spacing: f64,
    /// Column count; 0 picks the count automatically
    #[arg(long, default_value_t = 0, help_heading = "Grid")]
    columns: u32,
    /// Evaluate auto-column candidates in parallel (requires core feature `parallel`)
    #[arg(long, default_value_t = false, help_heading = "Grid")]
    parallel: bool,

    // Captions
    /// Caption font size (pt); also the reserved caption height
    #[arg(long, default_value_t = 10.0, help_heading = "Captions")]
    caption_size: f64,
    /// Padding above and below each caption (pt)
    #[arg(long, default_value_t = 5.0, help_heading = "Captions")]
    caption_gap: f64,
    /// Caption color as #rrggbb
    #[arg(long, default_value = "#000000", help_heading = "Captions")]
    caption_color: String,
    /// Caption font: Helvetica | Times-Roman | Courier (others fall back to Helvetica)
    #[arg(long, default_value = "Helvetica", help_heading = "Captions")]
    caption_font: String,
    /// Do not caption images with their file names
    #[arg(long, default_value_t = false, help_heading = "Captions")]
    no_captions: bool,

    // Export
    /// Coordinate frame for the JSON: page (bottom-up, points) | preview (top-down, pixels)
    #[arg(long, default_value = "page", value_parser = ["page", "preview"], help_heading = "Export")]
    frame: String,
    /// Preview width in pixels (PNG and preview-frame JSON)
    #[arg(long, default_value_t = 800, help_heading = "Export")]
    preview_width: u32,
    /// Draw red/blue outlines around image/caption rects in the PNG (debug)
    #[arg(long, default_value_t = false, help_heading = "Export")]
    outlines: bool,
    /// Do not draw the margin guide in the PNG
    #[arg(long, default_value_t = false, help_heading = "Export")]
    no_margin_guide: bool,
    /// Export layout stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute layout and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct EmbedArgs {
    /// PDF to draw onto; its page size replaces --page/--page-width/--page-height
    #[arg(help_heading = "Input/Output")]
    pdf: PathBuf,
    /// Page to draw onto (1-based)
    #[arg(long, default_value_t = 1, help_heading = "Input/Output")]
    page_number: u32,
    /// Output PDF (default: <out-dir>/<name>.pdf)
    #[arg(long, help_heading = "Input/Output")]
    output: Option<PathBuf>,
    #[command(flatten)]
    layout: LayoutArgs,
}

#[derive(Parser, Debug, Clone)]
struct BenchArgs {
    /// Input directory
    input: PathBuf,
    /// Column count; 0 picks the count automatically
    #[arg(long, default_value_t = 0)]
    columns: u32,
    /// Evaluate auto-column candidates in parallel
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Layout(args) => run_layout(args, false, cli.progress && !cli.quiet),
        Commands::Preview(args) => run_layout(args, true, cli.progress && !cli.quiet),
        Commands::Embed(args) => run_embed(args, cli.progress && !cli.quiet),
        Commands::Bench(b) => run_bench(b),
    }
}

fn run_layout(cli: &LayoutArgs, render_png: bool, show_progress: bool) -> anyhow::Result<()> {
    let cfg = build_config(cli)?;
    if cli.print_config {
        return print_config(&cfg, &cli.print_config_format);
    }
    let inputs = load_inputs(cli, show_progress)?;
    emit(cli, &cfg, &inputs, render_png)
}

fn print_config(cfg: &LayoutConfig, format: &str) -> anyhow::Result<()> {
    match format {
        "yaml" => println!("{}", serde_yaml::to_string(cfg)?),
        _ => println!("{}", serde_json::to_string_pretty(cfg)?),
    }
    Ok(())
}

fn caption_style(cli: &LayoutArgs) -> anyhow::Result<Option<Caption>> {
    if cli.no_captions {
        return Ok(None);
    }
    let mut style = Caption::new("");
    style.font_size = cli.caption_size;
    style.color = parse_hex_color(&cli.caption_color)?;
    style.font_family = cli.caption_font.clone();
    Ok(Some(style))
}

fn load_inputs(cli: &LayoutArgs, show_progress: bool) -> anyhow::Result<Vec<InputImage>> {
    let style = caption_style(cli)?;
    let paths = gather_paths(&cli.input, &cli.include, &cli.exclude)?;
    let inputs = load_images_with_progress(&paths, style.as_ref(), show_progress)?;
    info!(count = inputs.len(), "loaded input images");
    if inputs.is_empty() {
        anyhow::bail!("no images found under {}", cli.input.display());
    }
    Ok(inputs)
}

fn log_stats(stats: &LayoutStats) {
    info!(
        cols = stats.cols,
        rows = stats.rows,
        coverage = format!("{:.2}%", stats.coverage * 100.0),
        degenerate = stats.num_degenerate,
        "stats"
    );
}

/// Computes the layout and every requested output, then writes them.
/// Files are only written once all of them have been produced.
fn emit(
    cli: &LayoutArgs,
    cfg: &LayoutConfig,
    inputs: &[InputImage],
    render_png: bool,
) -> anyhow::Result<()> {
    let layout = compute_layout(inputs, cfg)?;
    let stats = layout.stats();
    log_stats(&stats);

    let mut files: Vec<(PathBuf, Vec<u8>)> = Vec::new();
    let keys: Vec<&str> = inputs.iter().map(|i| i.key.as_str()).collect();
    let json_value = match cli.frame.as_str() {
        "preview" => page_grid_core::to_json_preview(&layout, &keys, cli.preview_width as f64),
        _ => page_grid_core::to_json_page(&layout, &keys),
    };
    files.push((
        cli.out_dir.join(format!("{}.json", cli.name)),
        serde_json::to_vec_pretty(&json_value)?,
    ));

    if render_png {
        let opts = PreviewOptions {
            width_px: cli.preview_width,
            margin_guide: !cli.no_margin_guide,
            outlines: cli.outlines,
            ..Default::default()
        };
        let canvas = render_preview(inputs, &layout, &opts)?;
        let mut png = std::io::Cursor::new(Vec::new());
        canvas.write_to(&mut png, ImageFormat::Png)?;
        files.push((
            cli.out_dir.join(format!("{}.png", cli.name)),
            png.into_inner(),
        ));
    }

    if let Some(stats_path) = &cli.export_stats {
        files.push((stats_path.clone(), serde_json::to_vec_pretty(&stats)?));
    }

    if cli.dry_run {
        println!("{}", stats.summary());
        return Ok(());
    }
    write_outputs(&cli.out_dir, &files)
}

fn write_outputs(out_dir: &Path, files: &[(PathBuf, Vec<u8>)]) -> anyhow::Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("create out_dir {}", out_dir.display()))?;
    for (path, bytes) in files {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(path, bytes).with_context(|| format!("write {}", path.display()))?;
        info!(?path, "written");
    }
    Ok(())
}

fn run_embed(args: &EmbedArgs, show_progress: bool) -> anyhow::Result<()> {
    let cli = &args.layout;
    let cfg = build_config(cli)?;
    if cli.print_config {
        return print_config(&cfg, &cli.print_config_format);
    }
    let pdf = fs::read(&args.pdf).with_context(|| format!("read {}", args.pdf.display()))?;
    let inputs = load_inputs(cli, show_progress)?;

    let (bytes, layout, summary) = embed_pdf_bytes(&pdf, args.page_number, &inputs, &cfg)
        .map_err(|e| explain_failure(e, inputs.len()))?;
    let stats = layout.stats();
    log_stats(&stats);
    info!(
        page = args.page_number,
        images = summary.images,
        captions = summary.captions,
        skipped = summary.skipped,
        "embedded"
    );

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| cli.out_dir.join(format!("{}.pdf", cli.name)));
    let mut files = vec![(output, bytes)];
    if let Some(stats_path) = &cli.export_stats {
        files.push((stats_path.clone(), serde_json::to_vec_pretty(&stats)?));
    }
    if cli.dry_run {
        println!("{}", stats.summary());
        return Ok(());
    }
    write_outputs(&cli.out_dir, &files)
}

/// Runs the engine; geometric failures become a message asking the user to adjust inputs.
fn compute_layout(inputs: &[InputImage], cfg: &LayoutConfig) -> anyhow::Result<Layout> {
    layout_images(inputs, cfg).map_err(|e| explain_failure(e, inputs.len()))
}

fn explain_failure(e: PageGridError, count: usize) -> anyhow::Error {
    if e.is_layout_failure() {
        error!(error = %e, "layout failed");
        anyhow::anyhow!(
            "could not place {} images on the page ({}); adjust margins, spacing or columns",
            count,
            e
        )
    } else {
        e.into()
    }
}

fn run_bench(b: &BenchArgs) -> anyhow::Result<()> {
    use std::time::Instant;
    // Minimal bench: default page and captions; lay out once and print time + coverage
    let paths = gather_paths(&b.input, &[], &[])?;
    let style = Caption::new("");
    let inputs = load_images_with_progress(&paths, Some(&style), false)?;
    let cfg = LayoutConfig {
        columns: b.columns,
        parallel: b.parallel,
        ..Default::default()
    };
    let start = Instant::now();
    let layout = compute_layout(&inputs, &cfg)?;
    let dur = start.elapsed();
    let stats = layout.stats();
    println!(
        "items={} grid={}x{} coverage={:.2}% time={}",
        stats.num_items,
        stats.cols,
        stats.rows,
        stats.coverage * 100.0,
        bench_fmt_dur(dur)
    );
    Ok(())
}

fn bench_fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms >= 1.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{}us", d.as_micros())
    }
}

fn build_config(cli: &LayoutArgs) -> anyhow::Result<LayoutConfig> {
    let size: PageSize = cli
        .page
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown page size: {}", cli.page))?;
    let mut page = size.geometry(cli.landscape);
    if let Some(w) = cli.page_width {
        page.width = w;
    }
    if let Some(h) = cli.page_height {
        page.height = h;
    }
    let margins = Margins::new(
        cli.margin_top.unwrap_or(cli.margin),
        cli.margin_bottom.unwrap_or(cli.margin),
        cli.margin_left.unwrap_or(cli.margin),
        cli.margin_right.unwrap_or(cli.margin),
    );
    let base = LayoutConfig {
        page,
        margins,
        item_spacing: cli.spacing,
        columns: cli.columns,
        caption_gap: cli.caption_gap,
        parallel: cli.parallel,
    };

    // Config file overrides CLI values field by field
    let cfg = if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)?;
        y.into_layout_config(base)?
    } else {
        base
    };
    cfg.validate()?;
    Ok(cfg)
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    // Build glob matchers
    let mut inc_set = None;
    if !include.is_empty() {
        let mut b = GlobSetBuilder::new();
        for pat in include {
            b.add(Glob::new(pat)?);
        }
        inc_set = Some(b.build()?);
    }
    let mut exc_set = None;
    if !exclude.is_empty() {
        let mut b = GlobSetBuilder::new();
        for pat in exclude {
            b.add(Glob::new(pat)?);
        }
        exc_set = Some(b.build()?);
    }
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    // item order decides grid position
    list.sort();
    Ok(list)
}

fn should_skip(
    p: &Path,
    include: Option<&globset::GlobSet>,
    exclude: Option<&globset::GlobSet>,
) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if let Some(ex) = exclude {
        if ex.is_match(&s) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(&s) {
            return true;
        }
    }
    false
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp" | "gif" | "tif" | "tiff" | "webp")
    )
}

fn load_images_with_progress(
    paths: &[PathBuf],
    caption_style: Option<&Caption>,
    progress: bool,
) -> anyhow::Result<Vec<InputImage>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match InputImage::open(p) {
            Ok(mut input) => {
                if let Some(style) = caption_style {
                    let text = p
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    input = input.with_caption(Caption {
                        text,
                        ..style.clone()
                    });
                }
                list.push(input);
            }
            Err(e) => {
                error!(?p, error = %e, "skip image");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    page: Option<String>,
    landscape: Option<bool>,
    page_width: Option<f64>,
    page_height: Option<f64>,
    margin: Option<f64>,
    margin_top: Option<f64>,
    margin_bottom: Option<f64>,
    margin_left: Option<f64>,
    margin_right: Option<f64>,
    item_spacing: Option<f64>,
    columns: Option<u32>,
    caption_gap: Option<f64>,
    parallel: Option<bool>,
}

impl YamlConfig {
    fn into_layout_config(self, mut cfg: LayoutConfig) -> anyhow::Result<LayoutConfig> {
        if let Some(v) = self.page {
            let size: PageSize = v
                .parse()
                .map_err(|_| anyhow::anyhow!("unknown page size in config: {}", v))?;
            let landscape = self
                .landscape
                .unwrap_or(cfg.page.width > cfg.page.height);
            cfg.page = size.geometry(landscape);
        } else if self.landscape == Some(true) && cfg.page.width < cfg.page.height {
            cfg.page = PageGeometry::new(cfg.page.height, cfg.page.width);
        }
        if let Some(v) = self.page_width {
            cfg.page.width = v;
        }
        if let Some(v) = self.page_height {
            cfg.page.height = v;
        }
        if let Some(v) = self.margin {
            cfg.margins = Margins::uniform(v);
        }
        if let Some(v) = self.margin_top {
            cfg.margins.top = v;
        }
        if let Some(v) = self.margin_bottom {
            cfg.margins.bottom = v;
        }
        if let Some(v) = self.margin_left {
            cfg.margins.left = v;
        }
        if let Some(v) = self.margin_right {
            cfg.margins.right = v;
        }
        if let Some(v) = self.item_spacing {
            cfg.item_spacing = v;
        }
        if let Some(v) = self.columns {
            cfg.columns = v;
        }
        if let Some(v) = self.caption_gap {
            cfg.caption_gap = v;
        }
        if let Some(v) = self.parallel {
            cfg.parallel = v;
        }
        Ok(cfg)
    }
}
