//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over bankroll events from a CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding `Result<BetEvent, LedgerError>`
//! for each CSV row:
//!
//! ```no_run
//! use bankroll_ledger::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("events.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(event) => println!("Replaying {}", event.kind()),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found) are returned from `new()`
//! - Row errors are yielded as `ParseError` carrying the line number

use crate::io::csv_format::{convert_csv_record, EventCsvRecord};
use crate::types::{BetEvent, LedgerError};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Synchronous CSV reader
///
/// Reads one row at a time; memory use does not grow with the file.
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: u64,
}

impl SyncReader {
    /// Open a CSV event log
    ///
    /// The reader trims whitespace from all fields and accepts rows with fewer
    /// columns than the header.
    ///
    /// # Errors
    ///
    /// - `IoError` if the file cannot be opened
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        let file = File::open(path).map_err(|e| LedgerError::IoError {
            message: format!("Failed to open file '{}': {}", path.display(), e),
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 1,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<BetEvent, LedgerError>;

    /// Next event, or a `ParseError` tagged with the row's line number
    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<EventCsvRecord>();
        let row = deserializer.next()?;
        self.line_num += 1;
        let line = self.line_num;

        Some(
            row.map_err(LedgerError::from)
                .and_then(convert_csv_record)
                .map_err(|e| with_line(e, line)),
        )
    }
}

/// Attach a line number to a parse error that has none
pub(crate) fn with_line(error: LedgerError, line: u64) -> LedgerError {
    match error {
        LedgerError::ParseError {
            line: None,
            message,
        } => LedgerError::ParseError {
            line: Some(line),
            message,
        },
        other => other,
    }
}
