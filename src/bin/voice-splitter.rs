use clap::{Args, Parser, Subcommand};
use std::{
    fmt,
    io::{self, BufRead, Write},
    path::PathBuf,
    process,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use voice_splitter::{
    core::{
        batch::{outcome_line, RULE},
        prompt::run_session,
    },
    default_output_root, format_summary, model::registry::bundled_registry, prepare_model,
    set_download_progress_callback, set_split_progress_callback, split_directory, BatchOptions,
    OnnxSeparator, PartialWritePolicy, SplitOptions, SplitProgress, STARTUP_FATAL_MESSAGE,
};

const DEFAULT_MODEL: &str = "htdemucs_ort_v1";

#[derive(Parser)]
#[command(name = "voice-splitter")]
#[command(about = "Split every audio file in a folder into vocal and music tracks", long_about = None)]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Used when no subcommand is given
    #[command(flatten)]
    interactive: InteractiveArgs,
}

#[derive(Args, Clone)]
struct ModelArgs {
    #[arg(short, long, env = "VOICE_SPLITTER_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    #[arg(long, env = "VOICE_SPLITTER_MANIFEST_URL")]
    manifest_url: Option<String>,
}

impl ModelArgs {
    fn split_options(&self) -> SplitOptions {
        SplitOptions {
            model_name: self.model.clone(),
            manifest_url_override: self.manifest_url.clone(),
        }
    }
}

#[derive(Args, Clone)]
struct InteractiveArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Leave the vocal file on disk when the music file cannot be written
    #[arg(long)]
    keep_partial: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Separate one directory tree and exit
    Split {
        #[arg(short, long)]
        input: PathBuf,

        /// Defaults to `<input-name> (output)` in the current directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        model: ModelArgs,

        /// Leave the vocal file on disk when the music file cannot be written
        #[arg(long)]
        keep_partial: bool,

        #[arg(short, long)]
        quiet: bool,
    },

    /// Prompt for directories until end of input (the default)
    Interactive(InteractiveArgs),

    /// Download and verify the model only
    Prepare {
        #[command(flatten)]
        model: ModelArgs,

        #[arg(short, long)]
        quiet: bool,
    },

    /// List available models
    List,
}

/// The operator has already been told; `main` exits without printing again.
#[derive(Debug)]
struct AlreadyReported;

impl fmt::Display for AlreadyReported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("already reported")
    }
}

impl std::error::Error for AlreadyReported {}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Split {
            input,
            output,
            model,
            keep_partial,
            quiet,
        }) => handle_split(input, output, model, keep_partial, quiet),
        Some(Commands::Interactive(args)) => handle_interactive(args),
        None => handle_interactive(cli.interactive),
        Some(Commands::Prepare { model, quiet }) => handle_prepare(model, quiet),
        Some(Commands::List) => handle_list(),
    };

    match result {
        Ok(()) => process::exit(0),
        Err(e) if e.is::<AlreadyReported>() => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// `VOICE_SPLITTER_LOG` takes an `EnvFilter` directive. ONNX Runtime is kept
/// at error level unless asked for explicitly.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("VOICE_SPLITTER_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn,ort=error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn policy(keep_partial: bool) -> PartialWritePolicy {
    if keep_partial {
        PartialWritePolicy::Keep
    } else {
        PartialWritePolicy::Rollback
    }
}

fn load_separator(model: &ModelArgs) -> Result<OnnxSeparator, Box<dyn std::error::Error>> {
    println!("Loading separation model...");
    match OnnxSeparator::load(&model.split_options()) {
        Ok(separator) => {
            println!("Model loaded successfully!\n");
            Ok(separator)
        }
        Err(e) => {
            debug!("{e}");
            println!("{STARTUP_FATAL_MESSAGE}");
            Err(AlreadyReported.into())
        }
    }
}

fn handle_split(
    input: PathBuf,
    output: Option<PathBuf>,
    model: ModelArgs,
    keep_partial: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.is_dir() {
        return Err(format!("Input directory not found: {}", input.display()).into());
    }

    let output = match output {
        Some(o) => o,
        None => default_output_root(&input)?,
    };

    if !quiet {
        setup_progress_callbacks();
    }

    let mut separator = load_separator(&model)?;
    let options = BatchOptions {
        partial_writes: policy(keep_partial),
    };

    if !quiet {
        println!("{RULE}");
    }
    let summary = split_directory(&input, &output, &mut separator, &options)?;
    if !quiet {
        print!("{}", format_summary(&summary));
    } else {
        println!("{} {}", summary.files_processed, summary.tracks_written);
    }

    Ok(())
}

fn handle_interactive(args: InteractiveArgs) -> Result<(), Box<dyn std::error::Error>> {
    setup_progress_callbacks();

    let mut separator = match load_separator(&args.model) {
        Ok(separator) => separator,
        Err(e) => {
            // keep a double-clicked console window open until acknowledged
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line).ok();
            return Err(e);
        }
    };

    let options = BatchOptions {
        partial_writes: policy(args.keep_partial),
    };

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stdout = io::stdout();

    run_session(&mut input, &mut stdout, |dir, out| {
        let output = default_output_root(dir)?;
        writeln!(out, "{RULE}")?;
        let summary = split_directory(dir, &output, &mut separator, &options)?;
        writeln!(out, "{}", format_summary(&summary))?;
        Ok(())
    })?;

    Ok(())
}

fn handle_prepare(model: ModelArgs, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !quiet {
        eprintln!("📦 Preparing model: {}", model.model);
        eprintln!();
        setup_progress_callbacks();
    }

    let handle = prepare_model(&model.model, model.manifest_url.as_deref())?;

    if !quiet {
        eprintln!("✅ Model prepared successfully!");
        eprintln!("   {}", handle.local_path.display());
    } else {
        println!("{}", handle.local_path.display());
    }

    Ok(())
}

fn handle_list() -> Result<(), Box<dyn std::error::Error>> {
    let registry = bundled_registry()?;

    eprintln!("📋 Available Models");
    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for model in &registry.models {
        let marker = if model.name == registry.default {
            " (default)"
        } else {
            ""
        };
        eprintln!("  • {}{}", model.name, marker);
    }

    eprintln!();
    eprintln!("Use --model <name> to specify a model");

    Ok(())
}

fn setup_progress_callbacks() {
    set_download_progress_callback(|downloaded, total| {
        if total > 0 {
            let percent = (downloaded as f64 / total as f64 * 100.0).round() as u64;
            let downloaded_mb = downloaded as f64 / 1_000_000.0;
            let total_mb = total as f64 / 1_000_000.0;
            eprint!(
                "\r📥 Downloading model: {:>3}% ({:.2} MB / {:.2} MB)",
                percent, downloaded_mb, total_mb
            );
            if downloaded >= total {
                eprintln!();
            }
        } else {
            eprint!("\r📥 Downloading model: {:.2} MB", downloaded as f64 / 1_000_000.0);
        }
    });

    set_split_progress_callback(|progress| match progress {
        SplitProgress::FileStarted { name } => println!("Processing: {name}"),
        SplitProgress::Chunks {
            done,
            total,
            percent,
        } => {
            eprint!("\r🔄 {}/{} chunks ({:.0}%)", done, total, percent);
            if done >= total {
                eprint!("\r\x1b[2K");
            }
        }
        SplitProgress::FileFinished { outcome, .. } => println!("{}", outcome_line(outcome)),
    });
}
