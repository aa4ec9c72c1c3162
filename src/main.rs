//! Pascal-subset compiler CLI
//!
//! Command-line interface for compiling `.pas` sources to the target
//! stack VM's textual instruction format.

use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{Shell, generate};
use pascc::CompilerConfig;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "pascc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compile a Pascal subset to a stack-VM instruction listing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a .pas file, or every .pas file directly inside a directory
    Build {
        /// Input .pas source file or directory
        input: PathBuf,

        /// Directory to write .vm output into (defaults next to each source file)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pascc=info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, out_dir } => run_build(&input, out_dir),
        Commands::Completions { shell } => run_completions(shell),
    }
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "pascc", &mut io::stdout());
}

fn run_build(input: &Path, out_dir: Option<PathBuf>) {
    let mut config = CompilerConfig::new();
    if let Some(dir) = out_dir {
        config = config.with_out_dir(dir);
    }

    if input.is_dir() {
        run_build_directory(input, &config);
    } else {
        run_build_file(input, &config);
    }
}

fn run_build_file(input: &Path, config: &CompilerConfig) {
    let output = config.output_path_for(input);
    match pascc::compile_file_with_config(input, &output, config) {
        Ok(()) => {
            tracing::info!(source = %input.display(), output = %output.display(), "compiled");
            println!("Compiled {} -> {}", input.display(), output.display());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Compile every source file directly inside `dir`, non-recursively
/// (§6.3: directory-batch mode does not descend into subdirectories).
fn run_build_directory(dir: &Path, config: &CompilerConfig) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error: could not read directory {}: {e}", dir.display());
            process::exit(1);
        }
    };

    let mut compiled = 0;
    let mut failed = 0;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                eprintln!("Warning: could not read directory entry in {}: {e}", dir.display());
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(config.source_extension.as_str()) {
            continue;
        }

        let output = config.output_path_for(&path);
        match pascc::compile_file_with_config(&path, &output, config) {
            Ok(()) => {
                tracing::info!(source = %path.display(), output = %output.display(), "compiled");
                println!("Compiled {} -> {}", path.display(), output.display());
                compiled += 1;
            }
            Err(e) => {
                eprintln!("Error in {}: {e}", path.display());
                failed += 1;
            }
        }
    }

    println!("{compiled} file(s) compiled, {failed} failed");
    if failed > 0 {
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn build_directory_compiles_every_pas_file_non_recursively() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.pas"), "program a; begin writeln('a'); end.").unwrap();
        std::fs::write(dir.path().join("b.pas"), "program b; begin writeln('b'); end.").unwrap();
        std::fs::write(dir.path().join("ignore.txt"), "not pascal").unwrap();

        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("c.pas"), "program c; begin writeln('c'); end.").unwrap();

        let config = CompilerConfig::new();
        run_build_directory(dir.path(), &config);

        assert!(dir.path().join("a.vm").exists());
        assert!(dir.path().join("b.vm").exists());
        assert!(!nested.join("c.vm").exists());
    }

    #[test]
    fn build_directory_respects_out_dir_override() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.pas"), "program a; begin writeln('a'); end.").unwrap();
        let out_dir = tempdir().unwrap();

        let config = CompilerConfig::new().with_out_dir(out_dir.path());
        run_build_directory(dir.path(), &config);

        assert!(out_dir.path().join("a.vm").exists());
    }
}
