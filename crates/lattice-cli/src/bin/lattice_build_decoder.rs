// lattice-build-decoder: Rebuild the decoder transducer from a symbol table.
//
// Reads the composite-label table written by `lattice-disambiguate --symbols`
// and writes the transducer mapping those labels back to tags, so a lattice
// encoded in an earlier run can be decoded later.
//
// Usage:
//   lattice-build-decoder [SYMBOLS] [-o OUTPUT] [-v]

use std::path::PathBuf;

use clap::Parser;
use lattice_cli::{CliError, fatal, init_tracing, read_symbols, write_output};
use lattice_fst::decode::build_decoder;
use lattice_fst::text::{TextKind, write_fst};

#[derive(Parser, Debug)]
#[command(name = "lattice-build-decoder")]
#[command(about = "Build the tag decoder for a composite-label symbol table")]
struct Args {
    /// Symbol table (`symbol<TAB>id`); stdin when omitted or `-`
    #[arg(value_name = "SYMBOLS")]
    symbols: Option<PathBuf>,

    /// Output file; stdout when omitted or `-`
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: &Args) -> Result<(), CliError> {
    let symbols = read_symbols(args.symbols.as_deref())?;
    let decoder = build_decoder(&symbols)?;
    write_output(args.output.as_deref(), |w| {
        write_fst(&decoder, TextKind::Transducer, w)
    })
}

fn main() {
    let args = Args::parse();
    if let Err(e) = init_tracing(args.verbose) {
        fatal(&e.to_string());
    }
    if let Err(e) = run(&args) {
        fatal(&e.to_string());
    }
}
