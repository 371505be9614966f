// lattice-disambiguate: Keep the cheapest tag sequence for every word sequence.
//
// Reads an epsilon-free tropical transducer in AT&T text form (words on the
// input side, tags on the output side) and writes the disambiguated
// transducer in the same form.
//
// Usage:
//   lattice-disambiguate [INPUT] [-o OUTPUT] [OPTIONS]

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use lattice_cli::{CliError, fatal, init_tracing, read_lattice, write_output};
use lattice_fst::determinize::DeterminizeOptions;
use lattice_fst::disambiguate::{DisambiguateOptions, Disambiguation, disambiguate};
use lattice_fst::semiring::DELTA;
use lattice_fst::text::{TextKind, write_fst};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "lattice-disambiguate")]
#[command(about = "Keep the cheapest tag sequence for every word sequence of a lattice")]
struct Args {
    /// Input lattice (AT&T text); stdin when omitted or `-`
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output file; stdout when omitted or `-`
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Fail on equally cheap competing tag sequences instead of picking one
    #[arg(long)]
    restricted: bool,

    /// Also write the composite-weight symbol table
    #[arg(long, value_name = "PATH")]
    symbols: Option<PathBuf>,

    /// Also write the decoder transducer (AT&T text)
    #[arg(long, value_name = "PATH")]
    decoder: Option<PathBuf>,

    /// Quantization step for residual costs
    #[arg(long, default_value_t = DELTA)]
    delta: f32,

    /// Print one line per path (`words<TAB>tags<TAB>cost`) instead of the automaton
    #[arg(long)]
    paths: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn write_paths(out: &mut dyn Write, result: &Disambiguation) -> std::io::Result<()> {
    let paths = result
        .result
        .paths()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    for path in paths {
        let join = |labels: &[u32]| {
            labels
                .iter()
                .map(|l| l.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        };
        writeln!(
            out,
            "{}\t{}\t{}",
            join(&path.ilabels),
            join(&path.olabels),
            path.weight
        )?;
    }
    Ok(())
}

fn run(args: &Args) -> Result<(), CliError> {
    let lattice = read_lattice(args.input.as_deref())?;
    debug!(
        states = lattice.num_states(),
        arcs = lattice.total_arcs(),
        "read lattice"
    );

    let opts = DisambiguateOptions {
        determinize: DeterminizeOptions { delta: args.delta },
        restricted: args.restricted,
    };
    let out = disambiguate(&lattice, &opts)?;

    if let Some(path) = &args.symbols {
        write_output(Some(path.as_path()), |w| out.symbols.write_text(w))?;
    }
    if let Some(path) = &args.decoder {
        write_output(Some(path.as_path()), |w| write_fst(&out.decoder, TextKind::Transducer, w))?;
    }
    if args.paths {
        write_output(args.output.as_deref(), |w| write_paths(w, &out))
    } else {
        write_output(args.output.as_deref(), |w| {
            write_fst(&out.result, TextKind::Transducer, w)
        })
    }
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
