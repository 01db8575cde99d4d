use crate::error::{BulkError, Result};
use bigdecimal::{BigDecimal, Zero};
use std::str::FromStr;

/// Number of positional fields in every transaction row.
pub const FIELD_COUNT: usize = 10;

/// One row of an uploaded batch file.
///
/// Rows are positional: `id, requestId, paymentMode, payerIdentifierType,
/// payerIdentifier, payeeIdentifierType, payeeIdentifier, amount, currency,
/// note`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// 1-based row sequence number, unique within a batch.
    pub id: u32,
    pub request_id: String,
    pub payment_mode: String,
    pub payer_identifier_type: String,
    pub payer_identifier: String,
    pub payee_identifier_type: String,
    pub payee_identifier: String,
    /// Arbitrary precision amount, never routed through floating point.
    pub amount: BigDecimal,
    pub currency: String,
    pub note: String,
}

impl Transaction {
    /// Maps a parsed CSV record onto a transaction.
    ///
    /// `line` is the 1-based line of the record in the source file and is only
    /// used for error reporting. Records with fewer than [`FIELD_COUNT`] fields
    /// are rejected; trailing extra fields are ignored.
    pub fn from_record(line: u64, record: &csv::StringRecord) -> Result<Self> {
        if record.len() < FIELD_COUNT {
            return Err(BulkError::MalformedRow {
                line,
                reason: format!("expected {FIELD_COUNT} fields, found {}", record.len()),
            });
        }

        let id = record[0].parse::<u32>().map_err(|e| BulkError::MalformedRow {
            line,
            reason: format!("invalid id {:?}: {e}", &record[0]),
        })?;
        let amount = BigDecimal::from_str(&record[7]).map_err(|e| BulkError::MalformedRow {
            line,
            reason: format!("invalid amount {:?}: {e}", &record[7]),
        })?;

        Ok(Self {
            id,
            request_id: record[1].to_string(),
            payment_mode: record[2].to_string(),
            payer_identifier_type: record[3].to_string(),
            payer_identifier: record[4].to_string(),
            payee_identifier_type: record[5].to_string(),
            payee_identifier: record[6].to_string(),
            amount,
            currency: record[8].to_string(),
            note: record[9].to_string(),
        })
    }
}

/// Aggregate values the orchestrator needs from a batch file.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    /// Exact decimal sum of every row amount.
    pub amount: BigDecimal,
    pub currency: String,
    pub payer_identifier: String,
    pub transaction_count: usize,
}

impl BatchSummary {
    /// Computes the batch aggregates, or `None` for an empty batch.
    ///
    /// Currency and payer are taken from the first transaction. Batches are
    /// assumed to be uniform in both; other rows are not checked.
    pub fn from_transactions(transactions: &[Transaction]) -> Option<Self> {
        let first = transactions.first()?;
        let amount = transactions
            .iter()
            .fold(BigDecimal::zero(), |total, tx| total + &tx.amount);

        Some(Self {
            amount,
            currency: first.currency.clone(),
            payer_identifier: first.payer_identifier.clone(),
            transaction_count: transactions.len(),
        })
    }

    /// Total amount as a plain decimal string, no exponent and no grouping.
    pub fn amount_string(&self) -> String {
        self.amount.to_plain_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> csv::StringRecord {
        csv::StringRecord::from(fields.to_vec())
    }

    fn row(id: &str, amount: &str, currency: &str) -> csv::StringRecord {
        record(&[
            id, "req-1", "mojaloop", "MSISDN", "24450000000", "MSISDN", "24460000000", amount,
            currency, "salary",
        ])
    }

    #[test]
    fn test_record_maps_positional_fields() {
        let tx = Transaction::from_record(2, &row("1", "10.50", "USD")).unwrap();
        assert_eq!(tx.id, 1);
        assert_eq!(tx.payment_mode, "mojaloop");
        assert_eq!(tx.payer_identifier, "24450000000");
        assert_eq!(tx.payee_identifier, "24460000000");
        assert_eq!(tx.amount, BigDecimal::from_str("10.50").unwrap());
        assert_eq!(tx.currency, "USD");
        assert_eq!(tx.note, "salary");
    }

    #[test]
    fn test_short_record_is_malformed() {
        let short = record(&["1", "req-1", "mojaloop", "MSISDN", "2445", "MSISDN"]);
        let result = Transaction::from_record(2, &short);
        assert!(matches!(
            result,
            Err(BulkError::MalformedRow { line: 2, ref reason }) if reason.contains("found 6")
        ));
    }

    #[test]
    fn test_unparseable_amount_is_malformed() {
        let result = Transaction::from_record(4, &row("3", "ten", "USD"));
        assert!(matches!(result, Err(BulkError::MalformedRow { line: 4, .. })));
    }

    #[test]
    fn test_summary_sums_exactly() {
        let transactions = vec![
            Transaction::from_record(2, &row("1", "10.50", "USD")).unwrap(),
            Transaction::from_record(3, &row("2", "5.25", "USD")).unwrap(),
        ];
        let summary = BatchSummary::from_transactions(&transactions).unwrap();
        assert_eq!(summary.amount_string(), "15.75");
        assert_eq!(summary.currency, "USD");
        assert_eq!(summary.transaction_count, 2);
    }

    #[test]
    fn test_summary_keeps_precision_beyond_f64() {
        let transactions = vec![
            Transaction::from_record(2, &row("1", "0.1", "EUR")).unwrap(),
            Transaction::from_record(3, &row("2", "0.2", "EUR")).unwrap(),
            Transaction::from_record(4, &row("3", "12345678901234567890.000000000001", "EUR"))
                .unwrap(),
        ];
        let summary = BatchSummary::from_transactions(&transactions).unwrap();
        assert_eq!(summary.amount_string(), "12345678901234567890.300000000001");
    }

    #[test]
    fn test_summary_uses_first_row_for_currency_and_payer() {
        let mut second = Transaction::from_record(3, &row("2", "1", "KES")).unwrap();
        second.payer_identifier = "other".to_string();
        let transactions = vec![
            Transaction::from_record(2, &row("1", "1", "USD")).unwrap(),
            second,
        ];
        let summary = BatchSummary::from_transactions(&transactions).unwrap();
        assert_eq!(summary.currency, "USD");
        assert_eq!(summary.payer_identifier, "24450000000");
    }

    #[test]
    fn test_empty_batch_has_no_summary() {
        assert!(BatchSummary::from_transactions(&[]).is_none());
    }
}
