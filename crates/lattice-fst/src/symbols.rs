// Symbol table: label-to-string and string-to-label mapping.

use std::io::{self, Write};

use hashbrown::HashMap;

use crate::{EPSILON, FstError, Label};

/// Name of the epsilon symbol, always at label 0.
pub const EPSILON_SYMBOL: &str = "<eps>";

/// Bidirectional mapping between dense labels and symbol strings.
///
/// Label 0 is always [`EPSILON_SYMBOL`]. Labels are assigned in insertion
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    name: String,
    /// Maps label to its string.
    symbol_strings: Vec<String>,
    /// Maps string to its label.
    string_to_label: HashMap<String, Label>,
}

impl SymbolTable {
    pub fn new(name: impl Into<String>) -> Self {
        let mut table = Self {
            name: name.into(),
            symbol_strings: Vec::new(),
            string_to_label: HashMap::new(),
        };
        table.add_symbol(EPSILON_SYMBOL);
        table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Intern `symbol`, returning its existing label if already present.
    pub fn add_symbol(&mut self, symbol: &str) -> Label {
        if let Some(&label) = self.string_to_label.get(symbol) {
            return label;
        }
        let label = self.symbol_strings.len() as Label;
        self.symbol_strings.push(symbol.to_string());
        self.string_to_label.insert(symbol.to_string(), label);
        label
    }

    pub fn find_label(&self, symbol: &str) -> Option<Label> {
        self.string_to_label.get(symbol).copied()
    }

    pub fn find_symbol(&self, label: Label) -> Option<&str> {
        self.symbol_strings.get(label as usize).map(String::as_str)
    }

    /// Number of symbols, epsilon included.
    pub fn len(&self) -> usize {
        self.symbol_strings.len()
    }

    /// Always `false`: epsilon is present from construction.
    pub fn is_empty(&self) -> bool {
        self.symbol_strings.is_empty()
    }

    /// All `(label, symbol)` pairs in label order, epsilon first.
    pub fn iter(&self) -> impl Iterator<Item = (Label, &str)> {
        self.symbol_strings
            .iter()
            .enumerate()
            .map(|(i, s)| (i as Label, s.as_str()))
    }

    /// Write one `symbol<TAB>label` line per entry.
    pub fn write_text<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        for (label, symbol) in self.iter() {
            writeln!(out, "{symbol}\t{label}")?;
        }
        Ok(())
    }
}

/// Parse a symbol table written by [`SymbolTable::write_text`].
///
/// Labels must be dense and listed in increasing order starting with
/// `<eps>` at 0. Blank lines are skipped.
pub fn parse_symbol_table(name: &str, text: &str) -> Result<SymbolTable, FstError> {
    let mut table = SymbolTable::new(name);
    let mut expected: Label = 0;

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(symbol), Some(label), None) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(FstError::Parse {
                line: line_no,
                message: format!("expected `symbol label`, got `{line}`"),
            });
        };
        let label: Label = label.parse().map_err(|_| FstError::Parse {
            line: line_no,
            message: format!("invalid label `{label}`"),
        })?;
        if label != expected {
            return Err(FstError::Parse {
                line: line_no,
                message: format!("expected label {expected}, got {label}"),
            });
        }
        if label == EPSILON {
            if symbol != EPSILON_SYMBOL {
                return Err(FstError::Parse {
                    line: line_no,
                    message: format!("label 0 must be `{EPSILON_SYMBOL}`, got `{symbol}`"),
                });
            }
        } else if table.add_symbol(symbol) != label {
            return Err(FstError::Parse {
                line: line_no,
                message: format!("duplicate symbol `{symbol}`"),
            });
        }
        expected += 1;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_table_has_epsilon() {
        let table = SymbolTable::new("tags");
        assert_eq!(table.len(), 1);
        assert_eq!(table.find_label(EPSILON_SYMBOL), Some(EPSILON));
        assert_eq!(table.find_symbol(0), Some(EPSILON_SYMBOL));
        assert_eq!(table.name(), "tags");
    }

    #[test]
    fn add_symbol_interns() {
        let mut table = SymbolTable::new("tags");
        let a = table.add_symbol("12");
        let b = table.add_symbol("3\\4");
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(table.add_symbol("12"), a);
        assert_eq!(table.len(), 3);
        assert_eq!(table.find_symbol(b), Some("3\\4"));
        assert_eq!(table.find_label("missing"), None);
        assert_eq!(table.find_symbol(99), None);
    }

    #[test]
    fn text_round_trip() {
        let mut table = SymbolTable::new("tags");
        table.add_symbol("5");
        table.add_symbol("<1\\2>\\3_4");
        let mut buf = Vec::new();
        table.write_text(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "<eps>\t0\n5\t1\n<1\\2>\\3_4\t2\n");
        let parsed = parse_symbol_table("tags", &text).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn reject_sparse_labels() {
        let err = parse_symbol_table("t", "<eps>\t0\na\t2\n").unwrap_err();
        assert!(matches!(err, FstError::Parse { line: 2, .. }));
    }

    #[test]
    fn reject_duplicate_symbols() {
        let err = parse_symbol_table("t", "<eps>\t0\na\t1\na\t2\n").unwrap_err();
        assert!(matches!(err, FstError::Parse { line: 3, .. }));
    }

    #[test]
    fn reject_malformed_line() {
        assert!(parse_symbol_table("t", "<eps>\n").is_err());
        assert!(parse_symbol_table("t", "<eps>\t0\tx\n").is_err());
        assert!(parse_symbol_table("t", "<eps>\tzero\n").is_err());
    }
}
