use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Portuguese month names, January first.
pub const MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

static NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap());
static WRITTEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}) de ([a-zç]+) de (\d{4})").unwrap());
static RELATIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"h[áa]\s+(\d+)\s+(anos|ano|meses|mês|mes|dias|dia)\b").unwrap()
});

/// Unit of a relative "há N ..." expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeUnit {
    Years,
    Months,
    Days,
}

/// Every valid explicit date in `text`.
///
/// Numeric `D/M/Y` dates come first, then written "D de <mês> de Y" dates,
/// each group in text order. Matches that name an impossible calendar day
/// (31/02, 30 de fevereiro) are skipped.
pub fn extract_dates(text: &str) -> Vec<NaiveDate> {
    let lower = fold(text);
    let numeric = NUMERIC_RE.captures_iter(&lower).filter_map(|caps| {
        let day = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let year = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    });
    let written = WRITTEN_RE.captures_iter(&lower).filter_map(|caps| {
        let day = caps[1].parse().ok()?;
        let month = month_number(&caps[2])?;
        let year = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    });
    numeric.chain(written).collect()
}

/// 1-based month number for a Portuguese month name.
pub fn month_number(name: &str) -> Option<u32> {
    MONTHS
        .iter()
        .position(|m| *m == name)
        .and_then(|i| u32::try_from(i + 1).ok())
}

/// First relative expression in `text`, as (amount, unit).
pub fn relative_offset(text: &str) -> Option<(u32, RelativeUnit)> {
    let lower = fold(text);
    let caps = RELATIVE_RE.captures(&lower)?;
    let amount = caps[1].parse().ok()?;
    let unit = match &caps[2] {
        "ano" | "anos" => RelativeUnit::Years,
        "mês" | "mes" | "meses" => RelativeUnit::Months,
        _ => RelativeUnit::Days,
    };
    Some((amount, unit))
}

/// Year an offset of `amount` units before `now` falls in.
///
/// Month arithmetic borrows whole years while the running month is not
/// positive. `None` if the result leaves the representable calendar.
pub fn year_before(now: NaiveDate, amount: u32, unit: RelativeUnit) -> Option<i32> {
    match unit {
        RelativeUnit::Years => now.year().checked_sub(i32::try_from(amount).ok()?),
        RelativeUnit::Months => {
            let month = i64::from(now.month()) - i64::from(amount);
            // Same result as adding 12 / subtracting a year until month > 0.
            let borrowed = if month > 0 { 0 } else { -month / 12 + 1 };
            i32::try_from(i64::from(now.year()) - borrowed).ok()
        }
        RelativeUnit::Days => now
            .checked_sub_days(Days::new(u64::from(amount)))
            .map(|d| d.year()),
    }
}

/// Resolve the calendar year an event belongs to.
///
/// First match wins: an explicit date in `displayed_date`, an explicit date
/// anywhere in `block_texts`, a relative "há N anos/meses/dias" in
/// `displayed_date`, and finally `now`'s year.
pub fn resolve_year<S: AsRef<str>>(displayed_date: &str, block_texts: &[S], now: NaiveDate) -> i32 {
    if let Some(date) = extract_dates(displayed_date).first() {
        return date.year();
    }

    let joined = block_texts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ");
    if let Some(date) = extract_dates(&joined).first() {
        return date.year();
    }

    if let Some((amount, unit)) = relative_offset(displayed_date) {
        if let Some(year) = year_before(now, amount, unit) {
            return year;
        }
        tracing::debug!(amount, ?unit, "relative date out of range, using current year");
    }

    now.year()
}

fn fold(text: &str) -> String {
    text.nfc().collect::<String>().to_lowercase()
}
