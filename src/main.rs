use clap::{Parser, Subcommand};
use cropline::batch::{BatchJob, BatchResult, BatchSpec};
use cropline::imaging::{ConvertParams, ExportFormat, Quality, RustBackend};
use cropline::naming::OutputNaming;
use cropline::pipeline::{Operation, OperationPipeline, ResizeAlgorithm, ResizeOp};
use cropline::progress::{self, ProgressSink};
use cropline::{config, logging, output, selection};
use std::path::PathBuf;

/// Resize flags shared by convert and compress.
#[derive(clap::Args, Clone)]
struct ResizeArgs {
    /// Target width in pixels
    #[arg(long)]
    width: Option<u32>,
    /// Target height in pixels
    #[arg(long)]
    height: Option<u32>,
    /// Scale both sides by this percentage
    #[arg(long, conflicts_with_all = ["width", "height"])]
    percentage: Option<f64>,
    /// Ignore the aspect ratio when both width and height are given
    #[arg(long)]
    stretch: bool,
}

impl ResizeArgs {
    fn to_op(&self) -> Option<ResizeOp> {
        if self.width.is_none() && self.height.is_none() && self.percentage.is_none() {
            return None;
        }
        Some(ResizeOp {
            width: self.width,
            height: self.height,
            percentage: self.percentage,
            maintain_aspect: !self.stretch,
            algorithm: ResizeAlgorithm::default(),
        })
    }
}

#[derive(Parser)]
#[command(name = "cropline")]
#[command(about = "Batch image transforms: convert, compress, and edit pipelines")]
#[command(long_about = "\
Batch image transforms: convert, compress, and edit pipelines

Inputs may be files or directories; directories are searched recursively
for png, jpg, jpeg, webp, gif, bmp, tiff, tif and ico files.

Every file gets its own outcome. A file that fails is reported with its
error and never stops the rest of the batch.

Edit pipelines are JSON arrays of operations, applied in order:

  [
    {\"type\": \"rotate\", \"angle\": 90},
    {\"type\": \"crop\", \"x\": 0, \"y\": 0, \"width\": 800, \"height\": 600},
    {\"type\": \"resize\", \"percentage\": 50}
  ]

Run 'cropline gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output directory (overrides [output] dir)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Print batch results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show dimensions, format, and size of images
    Info { paths: Vec<PathBuf> },
    /// Convert images to another format
    Convert {
        paths: Vec<PathBuf>,
        /// Target format (png, jpeg, webp, gif, bmp, tiff, ico)
        #[arg(long)]
        format: ExportFormat,
        /// Encoding quality 1-100 (default from config)
        #[arg(long)]
        quality: Option<u32>,
        #[command(flatten)]
        resize: ResizeArgs,
    },
    /// Re-encode images in their own format
    Compress {
        paths: Vec<PathBuf>,
        /// Encoding quality 1-100 (default from config)
        #[arg(long)]
        quality: Option<u32>,
        #[command(flatten)]
        resize: ResizeArgs,
    },
    /// Apply an edit pipeline from a JSON file
    Edit {
        paths: Vec<PathBuf>,
        /// JSON array of operations
        #[arg(long)]
        pipeline: PathBuf,
        /// Export format (default: keep each source format)
        #[arg(long)]
        format: Option<ExportFormat>,
        /// Encoding quality 1-100 (default from config)
        #[arg(long)]
        quality: Option<u32>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(dir) = &cli.output_dir {
        config.output.dir = Some(dir.clone());
    }
    init_thread_pool(&config.processing);
    let backend = RustBackend::new();

    match cli.command {
        Command::Info { paths } => {
            let paths = selection::expand_inputs(&paths);
            let selection = selection::select_files(&backend, &paths);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&selection.accepted)?);
            } else {
                output::print_file_info(&selection.accepted, &selection.rejected);
            }
        }
        Command::Convert {
            paths,
            format,
            quality,
            resize,
        } => {
            let spec = BatchSpec::Convert(ConvertParams {
                format: Some(format),
                quality: quality.map(Quality::new).unwrap_or_else(|| config.quality()),
                resize: resize.to_op(),
            });
            run_batch(&backend, &paths, spec, &config.convert_naming(), cli.json)?;
        }
        Command::Compress {
            paths,
            quality,
            resize,
        } => {
            let spec = BatchSpec::Compress {
                quality: quality.map(Quality::new).unwrap_or_else(|| config.quality()),
                resize: resize.to_op(),
            };
            run_batch(&backend, &paths, spec, &config.convert_naming(), cli.json)?;
        }
        Command::Edit {
            paths,
            pipeline,
            format,
            quality,
        } => {
            let content = std::fs::read_to_string(&pipeline)?;
            let operations: Vec<Operation> = serde_json::from_str(&content)?;
            let spec = BatchSpec::Pipeline {
                operations,
                format,
                quality: quality.map(Quality::new).unwrap_or_else(|| config.quality()),
            };
            run_batch(&backend, &paths, spec, &config.edit_naming(), cli.json)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Select inputs, run the batch with a progress printer, and report.
fn run_batch(
    backend: &RustBackend,
    paths: &[PathBuf],
    spec: BatchSpec,
    naming: &OutputNaming,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let paths = selection::expand_inputs(paths);
    let selection = selection::select_files(backend, &paths);
    for line in output::format_rejections(&selection.rejected) {
        eprintln!("{}", line);
    }

    if !json {
        if let BatchSpec::Pipeline { operations, .. } = &spec {
            if let Some(first) = selection.accepted.first() {
                // Shows the chain for the first file; others may differ in size.
                if let Ok(pipeline) =
                    OperationPipeline::from_operations(first.dimensions(), operations.clone())
                {
                    output::print_pipeline(first.dimensions(), pipeline.operations());
                }
            }
        }
    }

    let mut job = BatchJob::new(spec);
    job.add_files(selection.accepted);

    let result = if json {
        job.run(backend, naming, &ProgressSink::disabled())
    } else {
        let (sink, subscription) = progress::channel();
        let printer = std::thread::spawn(move || {
            for p in subscription {
                output::print_progress(&p);
            }
        });
        let result = job.run(backend, naming, &sink);
        drop(sink);
        printer
            .join()
            .map_err(|_| "progress printer thread panicked")?;
        result
    };

    report(&result, json)?;
    if result.failed_count > 0 {
        return Err(format!("{} of {} files failed", result.failed_count, result.total()).into());
    }
    Ok(())
}

fn report(result: &BatchResult, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        output::print_batch_result(result);
    }
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
