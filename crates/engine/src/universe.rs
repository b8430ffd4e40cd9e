use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use common::{Error, Instrument, Result};

#[derive(Debug, Deserialize)]
struct UniverseRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Symbol", default)]
    symbol: Option<String>,
}

/// Read the instrument universe from a CSV file with a `Name` column and an
/// optional `Symbol` column.
pub fn read_universe(path: &Path, suffix: &str) -> Result<Vec<Instrument>> {
    let file = File::open(path)?;
    let instruments = read_universe_from(file, suffix)?;
    info!(path = %path.display(), instruments = instruments.len(), "Universe loaded");
    Ok(instruments)
}

pub fn read_universe_from<R: Read>(reader: R, suffix: &str) -> Result<Vec<Instrument>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    if !rdr.headers()?.iter().any(|h| h == "Name") {
        return Err(Error::Config("universe CSV has no 'Name' column".into()));
    }

    let mut instruments = Vec::new();
    for (line, row) in rdr.deserialize::<UniverseRow>().enumerate() {
        let row = row?;
        let explicit = row.symbol.filter(|s| !s.is_empty());
        let symbol = match explicit {
            Some(symbol) => symbol,
            None => match derive_symbol(&row.name, suffix) {
                Some(symbol) => symbol,
                None => {
                    // header is line 1
                    warn!(line = line + 2, "Skipping universe row with a blank name");
                    continue;
                }
            },
        };
        instruments.push(Instrument::new(symbol, row.name));
    }
    Ok(instruments)
}

/// First word of the company name, upper-cased, with `suffix` appended unless
/// it is already there.
pub fn derive_symbol(name: &str, suffix: &str) -> Option<String> {
    let base = name.split_whitespace().next()?.to_uppercase();
    if suffix.is_empty() || base.ends_with(&suffix.to_uppercase()) {
        Some(base)
    } else {
        Some(format!("{base}{suffix}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_is_first_word_with_suffix() {
        assert_eq!(derive_symbol("Reliance Industries Ltd", ".NS").as_deref(), Some("RELIANCE.NS"));
        assert_eq!(derive_symbol("  tcs  ", ".NS").as_deref(), Some("TCS.NS"));
        assert_eq!(derive_symbol("INFY.NS Infosys", ".NS").as_deref(), Some("INFY.NS"));
        assert_eq!(derive_symbol("   ", ".NS"), None);
    }

    #[test]
    fn empty_suffix_leaves_symbol_bare() {
        assert_eq!(derive_symbol("aapl", "").as_deref(), Some("AAPL"));
    }

    #[test]
    fn reads_rows_in_order_and_keeps_duplicates() {
        let csv = "Name,Sector\nReliance Industries,Energy\nHDFC Bank,Finance\nReliance Industries,Energy\n";
        let universe = read_universe_from(csv.as_bytes(), ".NS").unwrap();
        let symbols: Vec<_> = universe.iter().map(|i| i.symbol.as_str()).collect();
        assert_eq!(symbols, ["RELIANCE.NS", "HDFC.NS", "RELIANCE.NS"]);
        assert_eq!(universe[1].company_name, "HDFC Bank");
    }

    #[test]
    fn explicit_symbol_column_wins() {
        let csv = "Name,Symbol\nBajaj Auto,BAJAJ-AUTO.NS\nBajaj Finance,\n";
        let universe = read_universe_from(csv.as_bytes(), ".NS").unwrap();
        assert_eq!(universe[0].symbol, "BAJAJ-AUTO.NS");
        assert_eq!(universe[1].symbol, "BAJAJ.NS");
    }

    #[test]
    fn blank_names_are_skipped() {
        let csv = "Name\nWipro\n\"  \"\nITC\n";
        let universe = read_universe_from(csv.as_bytes(), ".NS").unwrap();
        assert_eq!(universe.len(), 2);
    }

    #[test]
    fn missing_name_column_is_an_error() {
        let err = read_universe_from("Ticker\nTCS\n".as_bytes(), ".NS").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
