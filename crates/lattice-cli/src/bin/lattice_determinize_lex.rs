// lattice-determinize-lex: Determinize a lattice over (cost, tag sequence) weights.
//
// Folds each tag into the arc weight and determinizes the resulting acceptor
// without decoding. Output lines are `src dst word cost,categorial`, which
// shows the residual quotients the decoder would have to resolve.
//
// Usage:
//   lattice-determinize-lex [INPUT] [--restricted] [--delta STEP] [-v]

use std::path::PathBuf;

use clap::Parser;
use lattice_cli::{CliError, fatal, init_tracing, read_lattice, write_output};
use lattice_fst::categorial::{CategorialKind, Left, LeftRestricted};
use lattice_fst::determinize::DeterminizeOptions;
use lattice_fst::disambiguate::determinize_lexicographic;
use lattice_fst::fst::StdFst;
use lattice_fst::semiring::DELTA;
use lattice_fst::text::{TextKind, write_fst};

#[derive(Parser, Debug)]
#[command(name = "lattice-determinize-lex")]
#[command(about = "Determinize a tagged lattice over lexicographic (cost, tags) weights")]
struct Args {
    /// Input lattice (AT&T text); stdin when omitted or `-`
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Fail on equally cheap competing tag sequences instead of picking one
    #[arg(long)]
    restricted: bool,

    /// Quantization step for residual costs
    #[arg(long, default_value_t = DELTA)]
    delta: f32,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn print<K: CategorialKind>(lattice: &StdFst, opts: &DeterminizeOptions) -> Result<(), CliError> {
    let determinized = determinize_lexicographic::<K>(lattice, opts)?;
    write_output(None, |w| write_fst(&determinized, TextKind::Acceptor, w))
}

fn run(args: &Args) -> Result<(), CliError> {
    let lattice = read_lattice(args.input.as_deref())?;
    let opts = DeterminizeOptions { delta: args.delta };
    if args.restricted {
        print::<LeftRestricted>(&lattice, &opts)
    } else {
        print::<Left>(&lattice, &opts)
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
