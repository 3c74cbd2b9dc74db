//! pagefit-pdf - PDF recropper and rescaler for e-reader displays
//!
//! CLI entry point

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use pagefit_pdf::{
    cli::{create_page_progress_bar, exit_codes},
    parse_mode, print_summary, BindingDirection, Cli, CliOverrides, Commands, Config, ConvertArgs,
    CropArgs, DeviceProfile, OptimizeResult, PageSource, PdfReader, Pipeline, PipelineConfig,
    PreviewArgs, ProcessingStage, ProgressCallback, SideMargins, SpreadMargins,
};

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert(args) => run_convert(&args),
        Commands::Crop(args) => run_crop(&args),
        Commands::Preview(args) => run_preview(&args),
        Commands::Info => run_info(),
    };

    std::process::exit(match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_codes::GENERAL_ERROR
        }
    });
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ============ Progress Callback Implementation ============

/// Console progress with an indicatif page bar.
struct ConsoleProgress {
    enabled: bool,
    bar: Mutex<Option<indicatif::ProgressBar>>,
}

impl ConsoleProgress {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            bar: Mutex::new(None),
        }
    }
}

impl ProgressCallback for ConsoleProgress {
    fn on_stage_start(&self, stage: ProcessingStage) {
        if self.enabled {
            println!("  {}", stage);
        }
    }

    fn on_page_progress(&self, stage: ProcessingStage, current: usize, total: usize) {
        if !self.enabled {
            return;
        }
        let mut guard = match self.bar.lock() {
            Ok(guard) => guard,
            Err(_) => return,
        };
        let bar = guard.get_or_insert_with(|| create_page_progress_bar(total as u64));
        bar.set_position(current as u64);
        bar.set_message(stage.name());
    }

    fn on_stage_complete(&self, _stage: ProcessingStage) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}

// ============ Convert Command ============

fn run_convert(args: &ConvertArgs) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();

    if !args.input.exists() {
        eprintln!("Error: Input path does not exist: {}", args.input.display());
        std::process::exit(exit_codes::INPUT_NOT_FOUND);
    }

    let pdf_files = collect_pdf_files(&args.input)?;
    if pdf_files.is_empty() {
        eprintln!("Error: No PDF files found in input path");
        std::process::exit(exit_codes::INPUT_NOT_FOUND);
    }

    let file_config = match &args.config {
        Some(config_path) => match Config::load_from_path(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                Config::default()
            }
        },
        None => Config::load().unwrap_or_default(),
    };

    let cli_overrides = create_cli_overrides(args)?;
    let mut pipeline_config = file_config.merge_with_cli(&cli_overrides);

    // CLI defaults apply when neither the config file nor an explicit flag
    // chose a value.
    if pipeline_config.device.is_none() && !args.no_device {
        pipeline_config.device = Some(DeviceProfile::lookup(&args.device));
    }
    if cli_overrides.margin.is_none() && file_config.detection.margin.is_none() {
        pipeline_config.margin_fraction = args.margin;
    }

    let pipeline = Pipeline::new(pipeline_config);

    if args.dry_run {
        print_execution_plan(args, &pdf_files, pipeline.config());
        return Ok(());
    }

    std::fs::create_dir_all(&args.output)?;

    let verbose = args.verbose > 0 && !args.quiet;
    let progress = ConsoleProgress::new(verbose);

    let mut ok_count = 0usize;
    let mut skip_count = 0usize;
    let mut error_count = 0usize;
    let mut results: Vec<OptimizeResult> = Vec::new();

    for (idx, pdf_path) in pdf_files.iter().enumerate() {
        let output_pdf = output_path_for(pdf_path, &args.output);

        if pipeline.config().skip_existing && !args.force && output_pdf.exists() {
            if verbose {
                println!(
                    "[{}/{}] Skipping (exists): {}",
                    idx + 1,
                    pdf_files.len(),
                    pdf_path.display()
                );
            }
            skip_count += 1;
            continue;
        }

        if verbose {
            println!(
                "[{}/{}] Processing: {}",
                idx + 1,
                pdf_files.len(),
                pdf_path.display()
            );
        }

        match pipeline.optimize(pdf_path, &output_pdf, &progress) {
            Ok(result) => {
                ok_count += 1;
                if verbose {
                    println!(
                        "    Completed: {} pages -> {}",
                        result.pages.len(),
                        result.output.display()
                    );
                }
                if args.report.is_some() {
                    results.push(result);
                }
            }
            Err(e) => {
                eprintln!("Error processing {}: {}", pdf_path.display(), e);
                error_count += 1;
            }
        }
    }

    if let Some(report_path) = &args.report {
        let json = serde_json::to_string_pretty(&results)?;
        std::fs::write(report_path, json)?;
        if verbose {
            println!("Report written to {}", report_path.display());
        }
    }

    let elapsed = start_time.elapsed();
    if !args.quiet {
        print_summary(pdf_files.len(), ok_count, skip_count, error_count);
        println!("Total time: {:.2}s", elapsed.as_secs_f64());
    }

    if error_count > 0 {
        return Err(format!("{} file(s) failed to process", error_count).into());
    }
    Ok(())
}

// ============ Helper Functions ============

/// Create CLI overrides from ConvertArgs
///
/// Only override config file values when CLI explicitly sets a non-default
/// value, so config files can provide defaults without clap clobbering them.
fn create_cli_overrides(args: &ConvertArgs) -> Result<CliOverrides, Box<dyn std::error::Error>> {
    const DEFAULT_DPI: u32 = 150;
    const DEFAULT_MARGIN: f64 = 0.005;
    const DEFAULT_DEVICE: &str = "paperwhite";

    let mut overrides = CliOverrides::new();

    if let Some(name) = args.mode.as_deref() {
        match parse_mode(name) {
            Some(mode) => overrides.mode = Some(mode),
            None => {
                eprintln!("Error: unknown detection mode: {}", name);
                std::process::exit(exit_codes::INVALID_ARGS);
            }
        }
    }

    overrides.threshold = args.threshold;

    if (args.margin - DEFAULT_MARGIN).abs() > f64::EPSILON {
        overrides.margin = Some(args.margin);
    }

    if args.dpi != DEFAULT_DPI {
        overrides.dpi = Some(args.dpi);
    }

    if args.no_device {
        overrides.no_device = true;
    } else if args.device != DEFAULT_DEVICE {
        overrides.device = Some(args.device.clone());
    }

    if args.per_page {
        overrides.uniform = Some(false);
    }

    overrides.threads = args.threads;

    if args.skip_existing {
        overrides.skip_existing = Some(true);
    }

    Ok(overrides)
}

/// Collect PDF files from input path (file or directory)
fn collect_pdf_files(input: &PathBuf) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut pdf_files = Vec::new();

    if input.is_file() {
        if input
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        {
            pdf_files.push(input.clone());
        }
    } else if input.is_dir() {
        for entry in std::fs::read_dir(input)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
            {
                pdf_files.push(path);
            }
        }
        pdf_files.sort();
    }

    Ok(pdf_files)
}

/// Output path for an input file inside the output directory.
fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output_dir.join(format!("{stem}_optimized.pdf"))
}

/// Print execution plan for dry-run mode
fn print_execution_plan(args: &ConvertArgs, pdf_files: &[PathBuf], config: &PipelineConfig) {
    println!("=== Dry Run - Execution Plan ===");
    println!();
    println!("Input: {}", args.input.display());
    println!("Output: {}", args.output.display());
    println!("Files to process: {}", pdf_files.len());
    println!();
    println!("Pipeline Configuration:");
    println!("  Detection mode: {:?}", config.mode);
    println!("  Detection DPI: {}", config.dpi);
    println!("  Threshold: {}", config.threshold);
    println!("  Margin fraction: {}", config.margin_fraction);
    println!(
        "  Crop: {}",
        if config.uniform {
            "uniform (one box for all pages)"
        } else {
            "per-page"
        }
    );
    match &config.device {
        Some(device) => println!(
            "  Device: {} ({}x{})",
            device.name, device.width, device.height
        ),
        None => println!("  Device: none (keep original size)"),
    }
    println!();
    println!("Processing Options:");
    println!("  Threads: {}", config.threads.unwrap_or_else(num_cpus::get));
    println!(
        "  Skip existing: {}",
        if config.skip_existing { "YES" } else { "NO" }
    );
    println!("  Force re-process: {}", if args.force { "YES" } else { "NO" });
    println!();
    println!("Files:");
    for (i, file) in pdf_files.iter().enumerate() {
        println!("  {}. {}", i + 1, file.display());
    }
}

// ============ Crop Command ============

fn run_crop(args: &CropArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.input.exists() {
        eprintln!("Error: Input path does not exist: {}", args.input.display());
        std::process::exit(exit_codes::INPUT_NOT_FOUND);
    }

    let base = SideMargins {
        left: args.left,
        right: args.right,
        top: args.top,
        bottom: args.bottom,
    };

    let margins = match args.binding.as_deref() {
        Some(name) => {
            let binding = match name.to_ascii_lowercase().as_str() {
                "ltr" => BindingDirection::LeftToRight,
                "rtl" => BindingDirection::RightToLeft,
                other => {
                    eprintln!("Error: unknown binding direction: {}", other);
                    std::process::exit(exit_codes::INVALID_ARGS);
                }
            };
            let inner = args.inner.unwrap_or(0.0);
            let outer = args.outer.unwrap_or(0.0);
            // A left-hand page has its spine on the right edge; a right-hand
            // page mirrors it.
            SpreadMargins::for_binding(
                binding,
                SideMargins {
                    left: outer,
                    right: inner,
                    ..base
                },
                SideMargins {
                    left: inner,
                    right: outer,
                    ..base
                },
            )
        }
        None => SpreadMargins::uniform(base),
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| pagefit_pdf::default_output_path(&args.input));

    let config = PipelineConfig::default()
        .with_device(args.device.as_deref().map(DeviceProfile::lookup));
    let pipeline = Pipeline::new(config);

    let progress = ConsoleProgress::new(args.verbose > 0);
    let result = pipeline.crop_manual(&args.input, &output, margins, &progress)?;

    println!(
        "Cropped {} pages -> {}",
        result.pages.len(),
        result.output.display()
    );
    Ok(())
}

// ============ Preview Command ============

fn run_preview(args: &PreviewArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.input.exists() {
        eprintln!("Error: Input path does not exist: {}", args.input.display());
        std::process::exit(exit_codes::INPUT_NOT_FOUND);
    }

    let mut config = PipelineConfig::default()
        .with_dpi(args.dpi)
        .with_margin(args.margin);
    if let Some(name) = args.mode.as_deref() {
        match parse_mode(name) {
            Some(mode) => config.mode = mode,
            None => {
                eprintln!("Error: unknown detection mode: {}", name);
                std::process::exit(exit_codes::INVALID_ARGS);
            }
        }
    }

    let pipeline = Pipeline::new(config);
    let report = pipeline.preview(&args.input, args.pages.max(1), &ConsoleProgress::new(false))?;

    println!("Document: {}", report.input.display());
    println!("Pages: {}", report.page_count);
    println!();
    println!("Sampled pages:");
    for page in &report.sampled {
        println!(
            "  page {:>4}: crop [{:.1}, {:.1}, {:.1}, {:.1}]  content {:.0}%",
            page.index + 1,
            page.crop_box.x0,
            page.crop_box.y0,
            page.crop_box.x1,
            page.crop_box.y1,
            page.content_ratio * 100.0
        );
    }
    if let Some(rect) = &report.uniform_box {
        println!();
        println!(
            "Uniform crop box: [{:.1}, {:.1}, {:.1}, {:.1}] ({:.1} x {:.1} pt)",
            rect.x0,
            rect.y0,
            rect.x1,
            rect.y1,
            rect.width(),
            rect.height()
        );
    }

    if let Some(report_path) = &args.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(report_path, json)?;
        println!();
        println!("Report written to {}", report_path.display());
    }

    if let Some(dir) = &args.save_images {
        std::fs::create_dir_all(dir)?;
        let reader = PdfReader::open(&args.input)?;
        for page in &report.sampled {
            let gray = reader.render_grayscale(page.index, args.dpi)?;
            let image_path = dir.join(format!("page_{:04}.png", page.index + 1));
            gray.save(&image_path)?;
        }
        println!();
        println!(
            "Saved {} page image(s) to {}",
            report.sampled.len(),
            dir.display()
        );
    }

    Ok(())
}

// ============ Info Command ============

fn run_info() -> Result<(), Box<dyn std::error::Error>> {
    println!("pagefit-pdf v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("System Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);
    println!("  CPUs: {}", num_cpus::get());

    println!();
    println!("PDF Tools:");
    check_tool_with_version("pdftoppm", "Poppler (render)", &["-v"]);
    check_tool_with_version("pdftotext", "Poppler (text layout)", &["-v"]);

    println!();
    println!("Device Profiles:");
    for profile in pagefit_pdf::DEVICE_PROFILES {
        println!(
            "  {:<12} {} x {}",
            profile.name, profile.width, profile.height
        );
    }

    println!();
    println!("Config File Locations:");
    println!("  Local: ./pagefit.toml");
    if let Some(config_dir) = dirs::config_dir() {
        println!(
            "  User:  {}",
            config_dir.join("pagefit-pdf/config.toml").display()
        );
    }

    Ok(())
}

fn check_tool_with_version(cmd: &str, name: &str, version_args: &[&str]) {
    match which::which(cmd) {
        Ok(path) => {
            if let Ok(output) = std::process::Command::new(&path).args(version_args).output() {
                // pdftoppm prints its version to stderr.
                let raw = if output.stdout.is_empty() {
                    output.stderr
                } else {
                    output.stdout
                };
                let version_str = String::from_utf8_lossy(&raw);
                let first_line = version_str.lines().next().unwrap_or("");
                if !first_line.is_empty() && first_line.len() < 80 {
                    println!("  {}: {} ({})", name, first_line.trim(), path.display());
                } else {
                    println!("  {}: {} (found)", name, path.display());
                }
            } else {
                println!("  {}: {} (found)", name, path.display());
            }
        }
        Err(_) => println!("  {}: Not found", name),
    }
}
