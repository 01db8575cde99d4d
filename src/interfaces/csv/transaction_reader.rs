use crate::domain::transaction::Transaction;
use crate::error::{BulkError, Result};
use std::io::Read;

/// Reads transaction rows from a batch file.
///
/// The first line is a header and is discarded. Blank lines are skipped and
/// records may vary in length so that short rows surface as
/// [`BulkError::MalformedRow`] instead of a CSV framing error.
pub struct TransactionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> TransactionReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily parses rows in file order.
    pub fn transactions(self) -> impl Iterator<Item = Result<Transaction>> {
        self.reader.into_records().map(|result| {
            let record = result.map_err(BulkError::from)?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            Transaction::from_record(line, &record)
        })
    }

    /// Parses every row, failing on the first malformed one.
    pub fn read_all(self) -> Result<Vec<Transaction>> {
        self.transactions().collect()
    }
}
