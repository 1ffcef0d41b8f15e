//! CSV format handling for bankroll events and platform output
//!
//! This module centralizes all CSV format concerns, providing:
//! - EventCsvRecord structure for deserialization
//! - Conversion from CSV records to bankroll events
//! - Platform report serialization
//!
//! All functions are pure (no I/O) for easy testing.
//!
//! # Input columns
//!
//! `type,user,bet,platform,amount,payout,odds,status,setting`
//!
//! | type | required | optional |
//! |---|---|---|
//! | `platform` | `platform`, `amount` (initial balance) | `setting` (category) |
//! | `mode` | `setting` (`immediate` / `on_loss`) | |
//! | `create` | `bet`, `platform`, `amount` (stake) | `payout`, `odds`, `status` |
//! | `update` | `bet` | `amount` (stake), `payout`, `odds`, `status` |
//! | `result` | `bet`, `status` | `payout`, `odds` |

use crate::core::engine::PlatformReport;
use crate::types::{
    BankrollMode, BetEvent, BetId, BetInput, BetStatus, BetUpdate, LedgerError, ManualResult,
    Money, PlatformCategory, UserId,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV record structure for deserialization
///
/// Every column but `type` and `user` is optional; which ones an event needs
/// depends on its type.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct EventCsvRecord {
    #[serde(rename = "type")]
    pub event_type: String,
    pub user: UserId,
    pub bet: Option<BetId>,
    pub platform: Option<String>,
    pub amount: Option<String>,
    pub payout: Option<String>,
    pub odds: Option<String>,
    pub status: Option<String>,
    pub setting: Option<String>,
}

/// Convert an EventCsvRecord to a BetEvent
///
/// # Errors
///
/// Returns `ParseError` (without a line number; readers add it) if:
/// - The event type is unknown
/// - A field the event type needs is missing
/// - An amount, odds, status, mode or category value does not parse
pub fn convert_csv_record(record: EventCsvRecord) -> Result<BetEvent, LedgerError> {
    let user = record.user;

    match record.event_type.trim().to_lowercase().as_str() {
        "platform" => Ok(BetEvent::OpenPlatform {
            user,
            name: required(&record.platform, "platform", "platform")?.to_string(),
            category: PlatformCategory::from_str(record.setting.as_deref().unwrap_or(""))
                .map_err(parse_error)?,
            initial_balance: required_money(&record.amount, "amount", "platform")?,
        }),
        "mode" => Ok(BetEvent::SetMode {
            user,
            mode: BankrollMode::from_str(required(&record.setting, "setting", "mode")?)
                .map_err(parse_error)?,
        }),
        "create" => {
            let mut input = BetInput::new(
                required_bet(&record)?,
                required(&record.platform, "platform", "create")?,
                required_money(&record.amount, "amount", "create")?,
            );
            input.payout = money(&record.payout, "payout")?;
            input.odds = decimal(&record.odds, "odds")?;
            input.status = status(&record.status)?.unwrap_or_default();

            Ok(BetEvent::Create { user, input })
        }
        "update" => Ok(BetEvent::Update {
            user,
            bet: required_bet(&record)?,
            update: BetUpdate {
                stake: money(&record.amount, "amount")?,
                payout: money(&record.payout, "payout")?,
                odds: decimal(&record.odds, "odds")?,
                status: status(&record.status)?,
            },
        }),
        "result" => Ok(BetEvent::Result {
            user,
            bet: required_bet(&record)?,
            result: ManualResult {
                status: status(&record.status)?
                    .ok_or_else(|| missing("status", "result"))?,
                payout: money(&record.payout, "payout")?,
                final_odds: decimal(&record.odds, "odds")?,
            },
        }),
        other => Err(parse_error(format!(
            "Invalid event type: '{}' for user {}",
            other, user
        ))),
    }
}

fn parse_error(message: String) -> LedgerError {
    LedgerError::ParseError {
        line: None,
        message,
    }
}

fn missing(field: &str, event_type: &str) -> LedgerError {
    parse_error(format!("'{}' event requires a {}", event_type, field))
}

/// A present, non-blank field
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(
    value: &'a Option<String>,
    field: &str,
    event_type: &str,
) -> Result<&'a str, LedgerError> {
    present(value).ok_or_else(|| missing(field, event_type))
}

fn required_bet(record: &EventCsvRecord) -> Result<BetId, LedgerError> {
    record
        .bet
        .ok_or_else(|| missing("bet", &record.event_type.to_lowercase()))
}

fn decimal(value: &Option<String>, field: &str) -> Result<Option<Decimal>, LedgerError> {
    present(value)
        .map(|raw| {
            Decimal::from_str(raw)
                .map_err(|_| parse_error(format!("Invalid {} '{}'", field, raw)))
        })
        .transpose()
}

fn money(value: &Option<String>, field: &str) -> Result<Option<Money>, LedgerError> {
    Ok(decimal(value, field)?.map(Money::new))
}

fn required_money(
    value: &Option<String>,
    field: &str,
    event_type: &str,
) -> Result<Money, LedgerError> {
    money(value, field)?.ok_or_else(|| missing(field, event_type))
}

fn status(value: &Option<String>) -> Result<Option<BetStatus>, LedgerError> {
    present(value)
        .map(|raw| BetStatus::from_str(raw).map_err(|e| parse_error(e.to_string())))
        .transpose()
}

/// Write platform reports to CSV format
///
/// Columns: user, platform, initial, balance, transactions. Reports are sorted
/// by user then platform name; balances are written with two decimal places.
///
/// # Errors
///
/// Returns `IoError` or `ParseError` if writing to `output` fails.
pub fn write_platforms_csv(
    reports: &[PlatformReport],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["user", "platform", "initial", "balance", "transactions"])?;

    let mut sorted: Vec<&PlatformReport> = reports.iter().collect();
    sorted.sort_by(|a, b| (a.user, &a.name).cmp(&(b.user, &b.name)));

    for report in sorted {
        writer.write_record(&[
            report.user.to_string(),
            report.name.clone(),
            format!("{:.2}", report.initial_balance),
            format!("{:.2}", report.current_balance),
            report.transactions.to_string(),
        ])?;
    }

    writer.flush()?;

    Ok(())
}
