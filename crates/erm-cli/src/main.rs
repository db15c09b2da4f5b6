//! ermc: ERM/VERM to Lua compiler.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use erm_core::{CompilerConfig, ScriptIndex};
use erm_runtime_lua::{check_syntax, load_script};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ermc")]
#[command(about = "Compile ERM and VERM scripts to Lua")]
struct Cli {
    /// Compiler configuration (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile scripts to Lua
    Compile {
        /// Input file(s), or - for stdin
        #[arg(required = true)]
        files: Vec<String>,

        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Write to stdout instead of files
        #[arg(long)]
        stdout: bool,
    },

    /// Compile scripts and verify the generated Lua loads
    Check {
        /// Input file(s)
        #[arg(required = true)]
        files: Vec<String>,
    },

    /// Print the trigger classification of a script as JSON
    Index {
        /// Input file, or - for stdin
        file: String,
    },

    /// Print the parsed lines of a script as JSON
    Parse {
        /// Input file, or - for stdin
        file: String,
    },
}

fn read_input(file: &str) -> std::io::Result<String> {
    if file == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file)
    }
}

fn output_path(file: &str, out: Option<&Path>) -> PathBuf {
    if file == "-" {
        return out.unwrap_or(Path::new(".")).join("output.lua");
    }
    let input = Path::new(file);
    match out {
        Some(dir) => {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            dir.join(format!("{}.lua", stem))
        }
        None => input.with_extension("lua"),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("ermc=info".parse()?)
                .add_directive("erm_runtime_lua=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => CompilerConfig::load(path)?,
        None => CompilerConfig::default(),
    };

    match cli.command {
        Commands::Compile { files, out, stdout } => {
            if let Some(dir) = &out {
                std::fs::create_dir_all(dir)?;
            }
            for file in files {
                let source = read_input(&file)?;
                let lua_code = load_script(&file, &source, &config)?;

                if stdout {
                    print!("{}", lua_code);
                } else {
                    let out_path = output_path(&file, out.as_deref());
                    std::fs::write(&out_path, &lua_code)?;
                    info!("{} -> {}", file, out_path.display());
                }
            }
        }

        Commands::Check { files } => {
            let mut failed = 0;
            for file in &files {
                let result = read_input(file)
                    .map_err(|e| e.to_string())
                    .and_then(|source| {
                        load_script(file, &source, &config).map_err(|e| e.to_string())
                    })
                    .and_then(|code| check_syntax(file, &code).map_err(|e| e.to_string()));
                match result {
                    Ok(()) => info!("{}: ok", file),
                    Err(reason) => {
                        error!("{}", reason);
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                return Err(format!("{} of {} script(s) failed", failed, files.len()).into());
            }
        }

        Commands::Index { file } => {
            let source = read_input(&file)?;
            let (_, lines) = erm_syntax::parse_source(&source, config.max_nesting_depth)?;
            let index = ScriptIndex::build(lines);
            println!("{}", serde_json::to_string_pretty(&index.summary())?);
        }

        Commands::Parse { file } => {
            let source = read_input(&file)?;
            let (_, lines) = erm_syntax::parse_source(&source, config.max_nesting_depth)?;
            println!("{}", serde_json::to_string_pretty(&lines)?);
        }
    }

    Ok(())
}
