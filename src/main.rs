use clap::{Parser, Subcommand};
use simple_heic::imaging::HeifBackend;
use simple_heic::{config, output, process};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "simple-heic")]
#[command(about = "Batch-convert HEIC photos to JPEG, copying other media through")]
#[command(long_about = "\
Batch-convert HEIC photos to JPEG, copying other media through

Every entry directly inside the input directory is handled by extension
(case-insensitive):

  .heic                 decoded and written as <name>.jpg, Exif preserved
  .jpg .png .mp4 .mp3   copied unchanged, timestamps preserved
  anything else         skipped

Subdirectories are not descended into. Files are processed in parallel and
one bad file never stops the others.

HEIC decoding needs the system libheif and is compiled in with the `heif`
cargo feature (cargo install simple-heic --features heif). A build without
it still copies media, but reports every .heic file as failed.

Exit status: 0 when every file succeeded, 1 when at least one file failed,
2 when the batch could not run at all.

Run 'simple-heic gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Flags for the convert command.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Directory holding the photos to convert
    #[arg(long)]
    input: PathBuf,

    /// Directory to write results to (created if missing)
    #[arg(long)]
    output: PathBuf,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum parallel workers (default: one per CPU core)
    #[arg(long, short = 'j')]
    jobs: Option<usize>,

    /// JPEG quality, 1-100
    #[arg(long)]
    quality: Option<u32>,

    /// Do not copy Exif metadata into converted JPEGs
    #[arg(long)]
    no_exif: bool,

    /// Write a JSON report of every file's outcome
    #[arg(long)]
    report: Option<PathBuf>,

    /// Also show skipped files and Exif status
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Convert HEIC files and copy supported media into the output directory
    Convert(ConvertArgs),
    /// Show what convert would do without writing anything
    Check {
        /// Directory holding the photos to inspect
        #[arg(long)]
        input: PathBuf,
    },
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match cli.command {
        Command::Convert(args) => convert(args),
        Command::Check { input } => {
            let plan = process::plan_batch(&input)?;
            output::print_plan(&plan);
            let has_heic = plan
                .iter()
                .any(|e| matches!(e.action, process::PlannedAction::Transcode { .. }));
            if has_heic && !HeifBackend::heic_supported() {
                eprintln!(
                    "warning: this build cannot decode HEIC; rebuild with `--features heif`"
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn convert(args: ConvertArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let overrides = config::Overrides {
        quality: args.quality,
        max_processes: args.jobs,
        no_exif: args.no_exif,
    };
    let convert_config = config::load_config(args.config.as_deref(), &overrides)?;
    let batch = process::BatchConfig::from_config(&args.input, &args.output, &convert_config);

    let verbose = args.verbose;
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_process_event(&event, verbose);
        }
    });

    let result = process::process(&batch, Some(tx));
    // The sender is gone either way, so the printer finishes
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;
    let report = result?;

    output::print_summary(&report);

    if let Some(path) = &args.report {
        std::fs::write(path, report.to_json()?)?;
    }

    Ok(if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
