use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::EngineOptions;

#[derive(Parser)]
#[command(name = "teddy")]
#[command(about = "Render and compile Teddy templates from the command line")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Template directory (overrides config and TEDDY_TEMPLATE_ROOT)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Engine verbosity: none, concise, verbose or debug
    #[arg(long, global = true)]
    verbosity: Option<String>,

    /// Abort on fatal markup errors instead of rendering what was parsed
    #[arg(long, global = true)]
    strict: bool,

    /// TOML engine configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template with a JSON model
    Render {
        /// Template name, relative to the template directory
        template: String,

        /// JSON file holding the model
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Write the output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// List the problems the render worked around
        #[arg(short, long)]
        warnings: bool,
    },

    /// Print the compiled form of templates
    Compile {
        #[arg(required = true)]
        templates: Vec<String>,
    },

    /// Print script statements registering compiled templates
    Package {
        #[arg(required = true)]
        templates: Vec<String>,

        /// Write the statements to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let options = EngineOptions {
        root: cli.root,
        verbosity: cli.verbosity,
        strict: cli.strict,
        config: cli.config,
    };
    let engine = options.build()?;

    match cli.command {
        Commands::Render {
            template,
            model,
            output,
            warnings,
        } => commands::render::run(&engine, &template, model, output, warnings),
        Commands::Compile { templates } => commands::compile::run(&engine, &templates),
        Commands::Package { templates, output } => {
            commands::compile::package(&engine, &templates, output)
        }
    }
}
