//! sitebooks-ingest: bank export parsing into ledger records.

pub mod bank_csv;

pub use bank_csv::{parse_amount, parse_bank_csv, parse_bank_csv_reader};
