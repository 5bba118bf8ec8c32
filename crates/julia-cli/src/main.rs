use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use julia_cli::{parse_backend_kinds, parse_complex, parse_rgb_list, parse_runs, ConfigOverrides};

mod commands;

use commands::{cmd_bench, cmd_devices, cmd_render};

#[derive(Parser)]
#[command(name = "julia")]
#[command(version, about = "Julia set generator with sequential, parallel and GPU backends", long_about = None)]
struct Cli {
    /// Config file (defaults: $JULIA_CONFIG, ./config/julia.yml, ./julia.yml, ~/julia/julia.yml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Generation settings shared by `render` and `bench`.
#[derive(Args)]
struct GenerationArgs {
    /// Julia constant C (re,im)
    #[arg(short = 'C', long, value_name = "RE,IM", allow_hyphen_values = true)]
    constant: Option<String>,

    /// Half-width of the rendered region of the complex plane
    #[arg(long, value_name = "FLOAT")]
    limit: Option<f32>,

    /// Palette as R,G,B;R,G,B;...
    #[arg(long, value_name = "COLORS")]
    palette: Option<String>,

    /// Output directory for images
    #[arg(short, long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// GPU platform selector (adapter name, vendor or graphics API)
    #[arg(long, value_name = "NAME")]
    platform: Option<String>,

    /// WGSL file replacing the built-in kernel
    #[arg(long, value_name = "FILE")]
    kernel: Option<PathBuf>,

    /// Block side length for the parallel backend
    #[arg(long, value_name = "PIXELS")]
    block_size: Option<u32>,

    /// Worker threads for the parallel backend
    #[arg(short = 'j', long, value_name = "N")]
    threads: Option<usize>,
}

impl GenerationArgs {
    fn into_overrides(self) -> Result<ConfigOverrides, String> {
        Ok(ConfigOverrides {
            constant: self.constant.as_deref().map(parse_complex).transpose()?,
            limit: self.limit,
            palette: self.palette.as_deref().map(parse_rgb_list).transpose()?,
            output_dir: self.out,
            platform: self.platform,
            kernel: self.kernel,
            block_size: self.block_size,
            threads: self.threads,
            ..Default::default()
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Render one image and save it as PNG
    Render {
        /// Backend: sequential, parallel or gpu
        #[arg(short, long, default_value = "parallel")]
        backend: String,

        /// Image side length in pixels
        #[arg(short, long, value_name = "PIXELS")]
        size: Option<u32>,

        /// Iteration cap per pixel
        #[arg(short = 'i', long, value_name = "N")]
        max_iterations: Option<u32>,

        /// Image name (without extension); defaults to a descriptive tag
        #[arg(short, long)]
        name: Option<String>,

        #[command(flatten)]
        generation: GenerationArgs,
    },

    /// Time backends over SIZE:ITERATIONS runs and append a CSV report
    Bench {
        /// Comma-separated SIZE:ITERATIONS list
        #[arg(short, long, default_value = "500:100,1000:300")]
        runs: String,

        /// Comma-separated backend list
        #[arg(short, long, default_value = "gpu,parallel,sequential")]
        backends: String,

        /// Report file (appended)
        #[arg(long, value_name = "FILE", default_value = "testdata.csv")]
        report: PathBuf,

        /// Also save every rendered image
        #[arg(long)]
        save: bool,

        #[command(flatten)]
        generation: GenerationArgs,
    },

    /// List GPU adapters
    Devices,
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Render {
            backend,
            size,
            max_iterations,
            name,
            generation,
        } => {
            let backend = backend.parse()?;
            let overrides = ConfigOverrides {
                size,
                max_iterations,
                ..generation.into_overrides()?
            };
            cmd_render(cli.config, backend, overrides, name)
        }

        Commands::Bench {
            runs,
            backends,
            report,
            save,
            generation,
        } => cmd_bench(
            cli.config,
            parse_backend_kinds(&backends)?,
            parse_runs(&runs)?,
            generation.into_overrides()?,
            report,
            save,
        ),

        Commands::Devices => cmd_devices(),
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
