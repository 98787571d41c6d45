use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use shader_ir::ir::{self, glsl, read::ReadOptions, Instruction, SymbolTable};
use shader_ir::storage::Storage;

/// Tools for working with textual shader IR.
#[derive(Debug, Parser)]
#[command(author, version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read a file of IR and print it back.
    Print {
        /// The path to the IR.
        path: PathBuf,

        /// Print shader source instead of IR.
        #[arg(long)]
        glsl: bool,

        /// Only allow calls to functions defined earlier in the file.
        #[arg(long)]
        no_prototypes: bool,
    },

    /// Check that a file of IR can be read.
    Check {
        /// The path to the IR.
        path: PathBuf,

        /// Only allow calls to functions defined earlier in the file.
        #[arg(long)]
        no_prototypes: bool,
    },
}

pub fn main() {
    let args = Args::parse();

    match args.command {
        Command::Print { path, glsl, no_prototypes } => {
            cmd_print(&path, glsl, no_prototypes)
        },
        Command::Check { path, no_prototypes } => {
            cmd_check(&path, no_prototypes)
        },
    }
}

/// Read and print a file of IR.
fn cmd_print(path: &Path, as_glsl: bool, no_prototypes: bool) {
    let storage = Storage::new();
    let ir = load(&storage, path, no_prototypes);

    let mut output = String::new();
    let result = if as_glsl {
        glsl::print_glsl(&mut output, &ir).map(|fidelity| {
            if fidelity == glsl::Fidelity::Partial {
                eprintln!("Warning: some of '{}' has no source form", path.display());
            }
        })
    } else {
        ir::print::print_ir(&mut output, &ir)
    };

    if result.is_err() {
        eprintln!("Error: could not print '{}'", path.display());
        std::process::exit(1);
    }
    print!("{}", output);
}

/// Check that a file of IR can be read.
fn cmd_check(path: &Path, no_prototypes: bool) {
    let storage = Storage::new();
    let ir = load(&storage, path, no_prototypes);
    println!("'{}': {} top-level instructions", path.display(), ir.len());
}

/// Read a file of IR, exiting on failure.
fn load<'c>(
    storage: &'c Storage<'c>,
    path: &Path,
    no_prototypes: bool,
) -> Vec<Instruction<'c>> {
    let input = match std::fs::read_to_string(path) {
        Ok(input) => input,
        Err(err) => {
            eprintln!("Could not open '{}': {}", path.display(), err);
            std::process::exit(1);
        },
    };

    let mut symbols = SymbolTable::with_builtins();
    let options = ReadOptions { scan_for_prototypes: !no_prototypes };
    match ir::read::read_ir(storage, &mut symbols, &input, options) {
        Ok(ir) => ir,
        Err(err) => {
            eprintln!("Error: could not read '{}'", path.display());
            eprintln!("{}", err);
            std::process::exit(1);
        },
    }
}
