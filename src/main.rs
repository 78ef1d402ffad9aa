use clap::{Parser, Subcommand};
use retouch::engine::{EnhanceMode, EnhancementRequest, Enhancer};
use retouch::mask::MaskStrategy;
use retouch::transforms::{FilterKind, apply_filter};
use retouch::{batch, config, io, output, quality};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn version_string() -> &'static str {
    let on_tag = env!("RETOUCH_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("RETOUCH_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "retouch")]
#[command(about = "Deterministic photo enhancement and background blur")]
#[command(long_about = "\
Deterministic photo enhancement and background blur

Every operation is classical image processing: the same input and the same
parameters always produce the same output, byte for byte.

Presets (strength 0-100 scales every step; 0 returns the input unchanged):
  general     balanced contrast, color and sharpening
  portrait    gentle, skin-friendly adjustments
  landscape   vivid color, strong contrast and edge definition

Upscale factors: 1, 2 or 4 (Lanczos3). Results larger than
[enhance] max_dimension are shrunk to fit.

Run 'retouch gen-config' to generate a documented retouch.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Shared flags for commands that run the enhancement pipeline.
#[derive(clap::Args, Clone)]
struct EnhanceArgs {
    /// Preset: general, portrait or landscape
    #[arg(long, default_value = "general")]
    preset: String,

    /// Upscale factor: 1, 2 or 4
    #[arg(long, default_value_t = 1)]
    scale: u32,

    /// Enhancement strength, 0-100
    #[arg(long, default_value_t = 50)]
    strength: u32,

    /// Override [enhance] mode: standard or quality-aware
    #[arg(long)]
    mode: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Enhance one image with a preset
    Enhance {
        input: PathBuf,
        /// Output file (default: <input>-enhanced.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        args: EnhanceArgs,
        /// Print metadata as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Blur the background while keeping the subject sharp
    Blur {
        input: PathBuf,
        /// Output file (default: <input>-blurred.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Blur strength, 1-30
        #[arg(long, default_value_t = 15)]
        strength: u32,
        /// Override [blur] mask: radial or edges
        #[arg(long)]
        mask: Option<String>,
        /// Print metadata as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Report brightness, contrast and sharpness scores
    Analyze {
        input: PathBuf,
        /// Print metrics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Apply a single named filter
    Filter {
        input: PathBuf,
        /// sharpen, blur, smooth, detail, edge-enhance or find-edges
        filter: String,
        /// Output file (default: <input>-<filter>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Enhance every image in a directory tree
    Batch {
        source: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        args: EnhanceArgs,
    },
    /// Print a stock retouch.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "retouch=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let command = match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(());
        }
        command => command,
    };
    let mut config = config::load_config(&cli.config)?;

    match command {
        Command::Enhance {
            input,
            output,
            args,
            json,
        } => {
            let (enhancer, request) = enhance_setup(&mut config, &args)?;
            let raster = io::load_raster(&input)?;
            let (enhanced, metadata) = enhancer.enhance(&raster, &request)?;
            let output = output.unwrap_or_else(|| derived_output(&input, "enhanced"));
            io::save_raster(&enhanced, &output, config.output.jpeg_quality)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&metadata)?);
            } else {
                output::print_enhance_output(&input, &output, &metadata);
            }
        }
        Command::Blur {
            input,
            output,
            strength,
            mask,
            json,
        } => {
            if let Some(mask) = mask {
                config.blur.mask = mask.parse::<MaskStrategy>()?;
            }
            let enhancer = Enhancer::new(config.enhance_options());
            let raster = io::load_raster(&input)?;
            let (blurred, metadata) = enhancer.blur_background(&raster, strength)?;
            let output = output.unwrap_or_else(|| derived_output(&input, "blurred"));
            io::save_raster(&blurred, &output, config.output.jpeg_quality)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&metadata)?);
            } else {
                output::print_blur_output(&input, &output, &metadata);
            }
        }
        Command::Analyze { input, json } => {
            let raster = io::load_raster(&input)?;
            let metrics = quality::analyze(&raster)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&metrics)?);
            } else {
                output::print_metrics(&input, &metrics);
            }
        }
        Command::Filter {
            input,
            filter,
            output,
        } => {
            let kind = filter.parse::<FilterKind>()?;
            let raster = io::load_raster(&input)?;
            let filtered = apply_filter(&raster, kind);
            let output = output.unwrap_or_else(|| derived_output(&input, kind.name()));
            io::save_raster(&filtered, &output, config.output.jpeg_quality)?;
            println!("{} \u{2192} {}", input.display(), output.display());
        }
        Command::Batch {
            source,
            output,
            args,
        } => {
            let (enhancer, request) = enhance_setup(&mut config, &args)?;
            init_thread_pool(&config.processing);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_batch_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = batch::run(
                &source,
                &output,
                &request,
                &enhancer,
                config.output.jpeg_quality,
                Some(tx),
            );
            printer.join().ok();
            let summary = result?;
            println!("==> Batch complete: {}", summary);
        }
        Command::GenConfig => {}
    }

    Ok(())
}

fn enhance_setup(
    config: &mut config::RetouchConfig,
    args: &EnhanceArgs,
) -> Result<(Enhancer, EnhancementRequest), Box<dyn std::error::Error>> {
    if let Some(mode) = &args.mode {
        config.enhance.mode = mode.parse::<EnhanceMode>()?;
    }
    let request = EnhancementRequest::parse(&args.preset, args.scale, args.strength)?;
    Ok((Enhancer::new(config.enhance_options()), request))
}

/// `dir/name.ext` → `dir/name-<suffix>.ext`.
fn derived_output(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    input.with_file_name(format!("{stem}-{suffix}.{ext}"))
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
