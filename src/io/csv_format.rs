//! Ledger export as CSV
//!
//! Columns: id, card, customer, kind, status, amount, fees, currency,
//! channel, rrn, stan, created_at, updated_at. Rows are sorted by id for
//! deterministic output.

use crate::types::TransactionRecord;
use std::io::Write;

const HEADER: [&str; 13] = [
    "id",
    "card",
    "customer",
    "kind",
    "status",
    "amount",
    "fees",
    "currency",
    "channel",
    "rrn",
    "stan",
    "created_at",
    "updated_at",
];

/// Write ledger records to CSV
///
/// # Arguments
///
/// * `records` - Records to write, in any order
/// * `output` - Writer receiving the CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_ledger_csv(
    records: &[TransactionRecord],
    output: &mut dyn Write,
) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(HEADER)
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted: Vec<&TransactionRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    for record in sorted {
        writer
            .write_record(&[
                record.id.clone(),
                record.card_id.clone(),
                record.customer_id.clone(),
                record.kind.as_str().to_string(),
                record.status.as_str().to_string(),
                record.amount.to_string(),
                record.fees.to_string(),
                record.currency.clone(),
                record.channel.clone(),
                record.network_metadata.rrn.clone(),
                record.network_metadata.stan.clone(),
                record.created_at.to_rfc3339(),
                record
                    .updated_at
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_default(),
            ])
            .map_err(|e| format!("Failed to write record {}: {}", record.id, e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush CSV writer: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NetworkMetadata, TransactionKind, TransactionStatus};
    use chrono::{TimeZone, Utc};

    fn record(id: &str, status: TransactionStatus) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            card_id: "card_1".to_string(),
            customer_id: "cus_1".to_string(),
            amount: 5000,
            fees: 100,
            currency: "NGN".to_string(),
            kind: TransactionKind::Capture,
            channel: "pos".to_string(),
            network_metadata: NetworkMetadata {
                rrn: "000123".to_string(),
                stan: "456".to_string(),
                ..NetworkMetadata::default()
            },
            status,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn test_write_empty_ledger() {
        let mut output = Vec::new();
        write_ledger_csv(&[], &mut output).unwrap();
        let csv = String::from_utf8(output).unwrap();
        assert_eq!(
            csv,
            "id,card,customer,kind,status,amount,fees,currency,channel,rrn,stan,created_at,updated_at\n"
        );
    }

    #[test]
    fn test_rows_sorted_by_id() {
        let mut reversed = record("auth_2", TransactionStatus::Reversed);
        reversed.updated_at = Some(Utc.with_ymd_and_hms(2026, 3, 2, 8, 30, 0).unwrap());
        let records = vec![reversed, record("auth_1", TransactionStatus::Approved)];

        let mut output = Vec::new();
        write_ledger_csv(&records, &mut output).unwrap();
        let csv = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "auth_1,card_1,cus_1,capture,approved,5000,100,NGN,pos,000123,456,2026-03-01T12:00:00+00:00,"
        );
        assert_eq!(
            lines[2],
            "auth_2,card_1,cus_1,capture,reversed,5000,100,NGN,pos,000123,456,2026-03-01T12:00:00+00:00,2026-03-02T08:30:00+00:00"
        );
    }
}
