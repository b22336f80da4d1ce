use std::io::Read;
use std::path::{Path, PathBuf};

use crossbeam_channel::Sender;
use tracing::info;

use crate::error::ChartError;
use crate::model::Record;

const REQUIRED_COLUMNS: [&str; 4] = ["symbol", "name", "marketcap", "country"];

#[derive(Debug, Clone)]
pub enum LoadMsg {
    Done(Vec<Record>),
    Error(String),
}

/// Parse CSV input into records. Any missing column or malformed row fails
/// the whole load; no partial chart is ever drawn from a bad file.
pub fn read_records<R: Read>(input: R) -> Result<Vec<Record>, ChartError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);
    let headers = reader.headers()?.clone();
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            return Err(ChartError::MissingColumn(col));
        }
    }
    let mut records = Vec::new();
    for row in reader.deserialize::<Record>() {
        records.push(row?);
    }
    info!(rows = records.len(), "loaded records");
    Ok(records)
}

pub fn load_path(path: &Path) -> Result<Vec<Record>, ChartError> {
    let file = std::fs::File::open(path)?;
    read_records(file)
}

/// One-shot background load for the app; the result arrives on the channel
/// and the rest of the pipeline runs synchronously from there.
pub fn load_in_background(path: PathBuf, tx: Sender<LoadMsg>) {
    std::thread::spawn(move || {
        let msg = match load_path(&path) {
            Ok(records) => LoadMsg::Done(records),
            Err(e) => LoadMsg::Error(e.to_string()),
        };
        let _ = tx.send(msg);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_csv() {
        let csv = "symbol,name,marketcap,country\n\
                   GOOG,Alphabet,1500000000000,United States\n\
                   BABA,Alibaba,300000000000,China\n";
        let records = read_records(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].symbol, "GOOG");
        assert_eq!(records[0].name, "Alphabet");
        assert!((records[0].marketcap - 1.5e12).abs() < 1.0);
        assert_eq!(records[1].country, "China");
    }

    #[test]
    fn rejects_missing_column() {
        let csv = "symbol,name,country\nGOOG,Alphabet,United States\n";
        assert!(matches!(
            read_records(csv.as_bytes()),
            Err(ChartError::MissingColumn("marketcap"))
        ));
    }

    #[test]
    fn rejects_non_numeric_value() {
        let csv = "symbol,name,marketcap,country\nGOOG,Alphabet,huge,United States\n";
        assert!(matches!(
            read_records(csv.as_bytes()),
            Err(ChartError::Csv(_))
        ));
    }

    #[test]
    fn extra_columns_are_ignored() {
        let csv = "rank,symbol,name,marketcap,country\n\
                   1,GOOG,Alphabet,1500000000000,United States\n";
        let records = read_records(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].symbol, "GOOG");
    }
}
