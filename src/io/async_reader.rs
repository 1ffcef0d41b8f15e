//! Asynchronous CSV reader with batch interface
//!
//! Provides batch reading of bankroll events for the async strategy.
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of BetEvents
//!                  ↓
//!           csv_format module
//!           (EventCsvRecord, convert_csv_record)
//! ```

use crate::io::csv_format::{convert_csv_record, EventCsvRecord};
use crate::io::sync_reader::with_line;
use crate::types::{BetEvent, LedgerError};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous CSV reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: u64,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 1,
        }
    }

    /// Read up to `batch_size` events
    ///
    /// Rows that fail to parse are logged and skipped. Returns an empty vector
    /// at end of file.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<BetEvent> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<EventCsvRecord>();

        while batch.len() < batch_size {
            let Some(row) = records.next().await else {
                break;
            };
            self.line_num += 1;

            let event = row
                .map_err(|e| LedgerError::ParseError {
                    line: None,
                    message: e.to_string(),
                })
                .and_then(convert_csv_record)
                .map_err(|e| with_line(e, self.line_num));

            match event {
                Ok(event) => batch.push(event),
                Err(e) => warn!(error = %e, "skipping row"),
            }
        }

        batch
    }
}
