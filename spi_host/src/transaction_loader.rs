use serde::Deserialize;
use spi_core::SpiTransaction;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{HostError, Result};

// one csv row: write,address,data
// address/data accept decimal or 0x-prefixed hex
#[derive(Debug, Deserialize)]
pub struct TransactionRecord {
    pub write: bool,
    pub address: String,
    pub data: String,
}

impl TransactionRecord {
    fn to_transaction(&self, row: usize) -> Result<SpiTransaction> {
        let address = parse_number(&self.address).map_err(|reason| HostError::InvalidRow { row, reason })?;
        let data = parse_number(&self.data).map_err(|reason| HostError::InvalidRow { row, reason })?;

        SpiTransaction::new(self.write, address, data).map_err(|e| HostError::InvalidRow {
            row,
            reason: e.to_string(),
        })
    }
}

fn parse_number(text: &str) -> std::result::Result<u16, String> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => text.parse::<u16>(),
    };
    parsed.map_err(|e| format!("'{}' is not a valid number ({})", text, e))
}

pub fn load_transactions(path: &str) -> Result<Vec<SpiTransaction>> {
    let file_path = Path::new(path);
    let file = File::open(file_path)?;
    let txs = read_transactions(file)?;

    if txs.is_empty() {
        return Err(HostError::Empty(path.to_string()));
    }
    Ok(txs)
}

pub fn read_transactions<R: Read>(reader: R) -> Result<Vec<SpiTransaction>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut txs = Vec::new();

    // row numbers are 1-based and skip the header, like a spreadsheet would show them
    for (i, result) in rdr.deserialize().enumerate() {
        let record: TransactionRecord = result?;
        txs.push(record.to_transaction(i + 2)?);
    }
    Ok(txs)
}
