//! framegrab: capture labeled still frames from a webcam or video file.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use framegrab::config::Config;
use framegrab::controller::{CaptureController, CaptureOptions};
use framegrab::labels::LabelSet;
use framegrab::source::{list_devices, SourceSelector};

/// Built-in defaults, used when neither the CLI nor the config file says
/// otherwise.
const DEFAULT_LABELS: &[&str] = &["one", "two", "three"];
const DEFAULT_SOURCE: &str = "0";
const DEFAULT_DELAY_MS: u64 = 1;
const DEFAULT_OUTPUT_DIR: &str = "Images";

/// framegrab: keyboard-driven frame capture for building labeled image sets
#[derive(Parser)]
#[command(name = "framegrab")]
#[command(version, about = "Capture labeled still frames from a webcam or video file")]
#[command(long_about = "Preview a webcam or video file as ASCII art in the terminal and \
    save the current frame as a JPEG by pressing a digit key. Each digit is bound to a \
    label; saved files are named <label>-<counter>.jpg with a per-label counter.")]
#[command(after_help = "EXAMPLES:
    # Capture from the default webcam with the default labels
    framegrab start

    # Step through a video file frame by frame (delay 0 waits for a key)
    framegrab start --source clips/run1.mp4 --delay-ms 0

    # Custom labels: '0' saves under 'cat', '1' under 'dog'
    framegrab start -l cat -l dog -o dataset

    # List available webcams
    framegrab list-cameras")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive capture loop
    #[command(after_help = "KEYS (while running):
    0-9    Save the current frame under the label at that index
    q      Quit
    other  Skip to the next frame")]
    Start {
        /// Label name, in key order; repeat for multiple labels (max 10)
        #[arg(long = "label", short = 'l')]
        labels: Vec<String>,

        /// Webcam index (e.g. 0) or path to a video file
        #[arg(long, short = 's')]
        source: Option<String>,

        /// How long each frame waits for a key, in milliseconds.
        /// 0 blocks until a key is pressed (frame stepping for video files)
        #[arg(long, short = 'd')]
        delay_ms: Option<u64>,

        /// Directory saved frames are written into (created if absent)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Custom config file path (default: platform config dir)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Mirror the preview horizontally (saved frames are not mirrored)
        #[arg(long)]
        mirror: bool,

        /// Invert preview brightness (for light terminal themes)
        #[arg(long)]
        invert: bool,
    },

    /// List available webcam devices
    ListCameras,
}

/// Merge CLI arguments over config file values over built-in defaults.
fn resolve_options(
    cli_labels: Vec<String>,
    cli_source: Option<String>,
    cli_delay_ms: Option<u64>,
    cli_output: Option<PathBuf>,
    cli_mirror: bool,
    cli_invert: bool,
    cfg: Config,
) -> Result<CaptureOptions, String> {
    let label_names = if !cli_labels.is_empty() {
        cli_labels
    } else {
        cfg.labels.names.unwrap_or_else(|| {
            DEFAULT_LABELS.iter().map(|s| s.to_string()).collect()
        })
    };
    let labels = LabelSet::new(label_names).map_err(|e| e.to_string())?;

    let source = cli_source
        .or(cfg.capture.source)
        .unwrap_or_else(|| DEFAULT_SOURCE.to_string());
    let selector = SourceSelector::from_arg(&source);

    let delay_ms = cli_delay_ms
        .or(cfg.capture.delay_ms)
        .unwrap_or(DEFAULT_DELAY_MS);

    let output_dir = cli_output
        .or(cfg.output.dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let mirror = cli_mirror || cfg.preview.mirror.unwrap_or(false);
    let invert = cli_invert || cfg.preview.invert.unwrap_or(false);

    Ok(CaptureOptions {
        selector,
        labels,
        delay_ms,
        output_dir,
        mirror,
        invert,
    })
}

fn run_start(options: CaptureOptions) -> Result<(), String> {
    let output_dir = options.output_dir.clone();
    let mut controller = CaptureController::new(options).map_err(|e| e.to_string())?;
    let stats = controller.run().map_err(|e| e.to_string())?;

    println!("Capture stopped ({}).", stats.stop);
    println!(
        "Frames shown: {}, frames saved: {}",
        stats.frames_shown, stats.frames_saved
    );
    for (label, count) in &stats.per_label {
        println!("  {}: {}", label, count);
    }
    if stats.frames_saved > 0 {
        println!("Saved to {}", output_dir.display());
    }
    Ok(())
}

fn run_list_cameras() -> Result<(), String> {
    let devices = list_devices().map_err(|e| e.to_string())?;
    if devices.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }
    for device in &devices {
        println!("{}", device);
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Start {
            labels,
            source,
            delay_ms,
            output,
            config,
            mirror,
            invert,
        }) => {
            // An explicitly named config file must exist; the default path
            // silently falls back to built-in defaults.
            let cfg = match config {
                Some(ref path) if !path.exists() => {
                    eprintln!("Error: config file '{}' not found", path.display());
                    std::process::exit(1);
                }
                Some(ref path) => match Config::load(Some(path.as_path())) {
                    Ok(c) => c,
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                },
                None => match Config::load(None) {
                    Ok(c) => c,
                    Err(e) => {
                        eprintln!("Warning: {}", e);
                        eprintln!("Using default settings.");
                        Config::default()
                    }
                },
            };

            let options =
                match resolve_options(labels, source, delay_ms, output, mirror, invert, cfg) {
                    Ok(options) => options,
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                };

            if let Err(e) = run_start(options) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::ListCameras) => {
            if let Err(e) = run_list_cameras() {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            // Show brief help when no command is provided
            println!("framegrab {}", env!("CARGO_PKG_VERSION"));
            println!("Capture labeled still frames from a webcam or video file\n");
            println!("USAGE:");
            println!("    framegrab <COMMAND>\n");
            println!("COMMANDS:");
            println!("    start         Run the interactive capture loop");
            println!("    list-cameras  List available webcam devices");
            println!("    help          Print this message or the help of a subcommand\n");
            println!("Run 'framegrab --help' for more details and examples.");
        }
    }
}
