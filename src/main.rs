//! figcrop - batch whitespace cropper for academic figures
//!
//! CLI entry point

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use figcrop::{
    collect_inputs,
    exit_codes,
    input_kind,
    progress,
    run_batch,
    validate_batch,
    // CLI
    Cli,
    CliOverrides,
    Commands,
    ConsoleProgress,
    CropArgs,
    InputKind,
    OutputMode,
    PageRenderer,
    PopplerRenderer,
    // Config
    Settings,
};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Crop(args) => {
            init_tracing(args.verbose);
            run_crop(&args)
        }
        Commands::Info => run_info(),
    };

    std::process::exit(match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_codes::GENERAL_ERROR
        }
    });
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

// ============ Crop Command ============

fn run_crop(args: &CropArgs) -> anyhow::Result<()> {
    let start_time = Instant::now();

    let inputs = collect_inputs(&args.inputs)?;
    if inputs.is_empty() {
        eprintln!("Error: no supported input files found");
        std::process::exit(exit_codes::INPUT_NOT_FOUND);
    }

    let file_settings = match &args.config {
        Some(path) => Settings::load_from_path(path)?,
        None => Settings::load()?,
    };
    let settings = file_settings.merge_with_cli(&create_cli_overrides(args));

    // fail fast: no job starts on a bad configuration
    if let Err(e) = validate_batch(&settings, &inputs) {
        eprintln!("Error: {}", e);
        std::process::exit(exit_codes::CONFIG_ERROR);
    }

    if args.save_config {
        let path = settings.save()?;
        if !args.quiet {
            println!("Settings saved to {}", path.display());
        }
    }

    if args.dry_run {
        print_execution_plan(&inputs, &settings, args);
        return Ok(());
    }

    // pdftoppm is only required when the batch contains PDFs
    let renderer = if inputs
        .iter()
        .any(|p| input_kind(p) == Some(InputKind::Pdf))
    {
        Some(PopplerRenderer::locate()?)
    } else {
        None
    };

    let threads = args.threads.unwrap_or_else(num_cpus::get);
    let mode = OutputMode::from_flags(args.quiet, args.verbose);
    let reporter = ConsoleProgress::new(inputs.len(), mode);

    let summary = run_batch(
        &inputs,
        &settings,
        renderer.as_ref().map(|r| r as &dyn PageRenderer),
        threads,
        &reporter,
    );

    for (path, error) in summary.failures() {
        eprintln!("Error processing {}: {}", path.display(), error);
    }

    if !args.quiet {
        progress::print_summary(inputs.len(), summary.succeeded(), summary.failed());
        println!("Total time: {:.2}s", start_time.elapsed().as_secs_f64());
    }

    if summary.failed() > 0 {
        anyhow::bail!("{} file(s) failed to process", summary.failed());
    }

    Ok(())
}

// ============ Helper Functions ============

/// Create CLI overrides from CropArgs.
///
/// Only values the user explicitly set override the config file.
fn create_cli_overrides(args: &CropArgs) -> CliOverrides {
    let mut overrides = CliOverrides::new();

    if args.in_place {
        overrides.overwrite = Some(true);
    }
    overrides.output_dir = args.output_dir.clone();

    overrides.margin_left = args.margin_left.or(args.margin);
    overrides.margin_top = args.margin_top.or(args.margin);
    overrides.margin_right = args.margin_right.or(args.margin);
    overrides.margin_bottom = args.margin_bottom.or(args.margin);

    overrides.threshold = args.threshold;
    overrides.min_content_size = args.min_size;

    overrides
}

/// Print execution plan for dry-run mode.
fn print_execution_plan(inputs: &[PathBuf], settings: &Settings, args: &CropArgs) {
    println!("=== Dry Run - Execution Plan ===");
    println!();
    println!("Files to process: {}", inputs.len());
    println!();
    println!("Settings:");
    println!(
        "  Overwrite originals: {}",
        if settings.overwrite_original { "YES" } else { "NO" }
    );
    if let Some(dir) = &settings.output_dir {
        println!("  Output directory: {}", dir.display());
    }
    println!(
        "  Margins (l/t/r/b): {}/{}/{}/{}",
        settings.margins.left, settings.margins.top, settings.margins.right, settings.margins.bottom
    );
    println!("  Threshold: {}", settings.threshold);
    println!("  Min content size: {} px", settings.min_content_size);
    println!("  Threads: {}", args.threads.unwrap_or_else(num_cpus::get));
    println!();
    println!("Files:");
    for (i, input) in inputs.iter().enumerate() {
        println!(
            "  {}. {} -> {}",
            i + 1,
            input.display(),
            settings.output_path(input).display()
        );
    }
}

// ============ Info Command ============

fn run_info() -> anyhow::Result<()> {
    println!("figcrop v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("System Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);
    println!("  CPUs: {}", num_cpus::get());

    println!();
    println!("PDF Rendering Tools:");
    check_tool("pdftoppm", "Poppler");

    println!();
    println!(
        "Supported image formats: {}",
        figcrop::IMAGE_EXTENSIONS.join(", ")
    );

    println!();
    println!("Config File Locations:");
    println!("  Local: ./figcrop.toml");
    if let Some(path) = Settings::user_config_path() {
        println!("  User:  {}", path.display());
    }

    Ok(())
}

fn check_tool(cmd: &str, name: &str) {
    match which::which(cmd) {
        Ok(path) => println!("  {}: {} (found)", name, path.display()),
        Err(_) => println!("  {}: Not found", name),
    }
}
