//! Generic bank-export CSV parser.
//!
//! Expected header (column order is free, `merchant`, `id` and `category` optional):
//!   id,date,name,merchant,amount,category
//!
//! Amounts are signed from the business's point of view: negative = money out.
//! `$`, thousands separators and accounting-style parentheses are accepted.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use sitebooks_core::{Category, TransactionRecord};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;
use tracing::warn;

const AMOUNT_PATTERN: &str = r"^(?P<neg>-)?\$?(?P<num>\d[\d,]*(?:\.\d+)?|\.\d+)$";

static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(AMOUNT_PATTERN).expect("AMOUNT_PATTERN is a valid regex"));

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(default)]
    id: String,
    date: String,
    name: String,
    #[serde(default)]
    merchant: String,
    amount: String,
    #[serde(default)]
    category: String,
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .ok()
}

/// Parse a single amount cell such as `-1,249.99`, `$15,000.00` or `(50.00)`.
pub fn parse_amount(s: &str) -> Option<f64> {
    let s = s.trim();
    let (inner, parenthesized) = match s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        Some(inner) => (inner.trim(), true),
        None => (s, false),
    };
    let caps = AMOUNT_RE.captures(inner)?;
    let value: f64 = caps["num"].replace(',', "").parse().ok()?;
    let negative = parenthesized || caps.name("neg").is_some();
    Some(if negative { -value } else { value })
}

/// Parse a bank CSV file, tagging every record with `account`.
pub fn parse_bank_csv(path: impl AsRef<Path>, account: &str) -> Result<Vec<TransactionRecord>> {
    let file = std::fs::File::open(path.as_ref())
        .with_context(|| format!("opening {}", path.as_ref().display()))?;
    parse_bank_csv_reader(file, account)
        .with_context(|| format!("parsing {}", path.as_ref().display()))
}

/// Parse bank CSV from any reader. Rows with an unreadable date or amount are skipped.
pub fn parse_bank_csv_reader(reader: impl Read, account: &str) -> Result<Vec<TransactionRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut out = Vec::new();
    // Identical rows without an id get a running suffix so they stay distinct.
    let mut occurrences: HashMap<String, usize> = HashMap::new();

    for (line, result) in rdr.deserialize::<Row>().enumerate() {
        let row = result.with_context(|| format!("row {}", line + 1))?;

        let Some(date) = parse_date(&row.date) else {
            warn!(row = line + 1, date = %row.date, "skipping row with unparseable date");
            continue;
        };
        let Some(amount) = parse_amount(&row.amount) else {
            warn!(row = line + 1, amount = %row.amount, "skipping row with unparseable amount");
            continue;
        };

        let id = if row.id.is_empty() {
            let key = format!("{}:{}:{:.2}", date, row.name.to_lowercase(), amount);
            let n = occurrences.entry(key.clone()).or_insert(0);
            *n += 1;
            format!("{key}#{n}")
        } else {
            row.id
        };

        let mut record = TransactionRecord::new(id, date, row.name, amount, account);
        if !row.merchant.is_empty() {
            record.merchant_name = Some(row.merchant);
        }
        if !row.category.is_empty() {
            match row.category.parse::<Category>() {
                Ok(c) => record.category = Some(c),
                Err(_) => warn!(row = line + 1, category = %row.category, "ignoring unknown category"),
            }
        }
        out.push(record);
    }

    Ok(out)
}
