// lattice-cli: shared utilities for CLI tools.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use lattice_fst::FstError;
use lattice_fst::decode::SYMBOL_TABLE_NAME;
use lattice_fst::fst::StdFst;
use lattice_fst::symbols::{SymbolTable, parse_symbol_table};
use lattice_fst::text::{TextKind, parse_fst};

/// Path argument meaning stdin or stdout.
pub const STDIO_PATH: &str = "-";

/// Errors surfaced by the command-line tools.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read {}: {source}", display_path(.path))]
    Read {
        path: Option<PathBuf>,
        source: io::Error,
    },
    #[error("failed to write {}: {source}", display_output(.path))]
    Write {
        path: Option<PathBuf>,
        source: io::Error,
    },
    #[error("{}: {source}", display_path(.path))]
    Fst {
        path: Option<PathBuf>,
        source: FstError,
    },
    #[error(transparent)]
    Pipeline(#[from] FstError),
    #[error("failed to initialise logging: {0}")]
    Logging(#[from] tracing::subscriber::SetGlobalDefaultError),
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => p.display().to_string(),
        None => "<stdin>".to_string(),
    }
}

fn display_output(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => p.display().to_string(),
        None => "<stdout>".to_string(),
    }
}

/// `None` for stdin/stdout, the path otherwise.
fn explicit(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| p.as_os_str() != STDIO_PATH)
}

/// Install a stderr fmt subscriber; `-v` switches from warnings to debug output.
pub fn init_tracing(verbose: bool) -> Result<(), CliError> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Read a whole file, or stdin when `path` is `None` or `-`.
pub fn read_input(path: Option<&Path>) -> Result<String, CliError> {
    let path = explicit(path);
    let mut text = String::new();
    let result = match path {
        Some(p) => File::open(p).and_then(|mut f| f.read_to_string(&mut text)),
        None => io::stdin().lock().read_to_string(&mut text),
    };
    result.map_err(|source| CliError::Read {
        path: path.map(Path::to_path_buf),
        source,
    })?;
    Ok(text)
}

/// Read a tropical transducer in AT&T text form.
pub fn read_lattice(path: Option<&Path>) -> Result<StdFst, CliError> {
    let text = read_input(path)?;
    parse_fst(&text, TextKind::Transducer).map_err(|source| CliError::Fst {
        path: explicit(path).map(Path::to_path_buf),
        source,
    })
}

/// Read a composite-label symbol table written by `lattice-disambiguate --symbols`.
pub fn read_symbols(path: Option<&Path>) -> Result<SymbolTable, CliError> {
    let text = read_input(path)?;
    parse_symbol_table(SYMBOL_TABLE_NAME, &text).map_err(|source| CliError::Fst {
        path: explicit(path).map(Path::to_path_buf),
        source,
    })
}

/// Run `write` against a buffered file, or stdout when `path` is `None` or `-`.
pub fn write_output<F>(path: Option<&Path>, write: F) -> Result<(), CliError>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let path = explicit(path);
    let result = match path {
        Some(p) => File::create(p).and_then(|f| {
            let mut out = BufWriter::new(f);
            write(&mut out)?;
            out.flush()
        }),
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            write(&mut out).and_then(|_| out.flush())
        }
    };
    result.map_err(|source| CliError::Write {
        path: path.map(Path::to_path_buf),
        source,
    })
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("lattice-cli-{}-{name}", process::id()))
    }

    #[test]
    fn dash_means_stdio() {
        assert_eq!(explicit(Some(Path::new("-"))), None);
        assert_eq!(explicit(None), None);
        assert_eq!(
            explicit(Some(Path::new("in.txt"))),
            Some(Path::new("in.txt"))
        );
    }

    #[test]
    fn missing_file_names_the_path() {
        let path = scratch("missing");
        let err = read_input(Some(path.as_path())).unwrap_err();
        assert!(matches!(err, CliError::Read { .. }));
        assert!(err.to_string().contains("lattice-cli-"));
    }

    #[test]
    fn write_then_read_lattice() {
        let path = scratch("lattice.txt");
        write_output(Some(path.as_path()), |out| out.write_all(b"0 1 1 10 1.5\n1\n")).unwrap();
        let fst = read_lattice(Some(path.as_path())).unwrap();
        assert_eq!(fst.num_states(), 2);
        assert_eq!(fst.arcs(0)[0].olabel, 10);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn write_then_read_symbols() {
        let path = scratch("symbols.txt");
        let mut table = SymbolTable::new(SYMBOL_TABLE_NAME);
        table.add_symbol("10");
        table.add_symbol("10\\11_12");
        write_output(Some(path.as_path()), |out| table.write_text(out)).unwrap();
        let read = read_symbols(Some(path.as_path())).unwrap();
        assert_eq!(read.find_label("10\\11_12"), Some(2));
        std::fs::remove_file(&path).unwrap();

        let path = scratch("bad-symbols.txt");
        write_output(Some(path.as_path()), |out| out.write_all(b"<eps>\t0\nx\t5\n")).unwrap();
        let err = read_symbols(Some(path.as_path())).unwrap_err();
        assert!(err.to_string().contains("bad-symbols.txt"), "{err}");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn parse_errors_carry_the_path() {
        let path = scratch("bad.txt");
        write_output(Some(path.as_path()), |out| out.write_all(b"0 1 x 1\n")).unwrap();
        let err = read_lattice(Some(path.as_path())).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("bad.txt"), "{message}");
        assert!(message.contains("line 1"), "{message}");
        std::fs::remove_file(&path).unwrap();
    }
}
