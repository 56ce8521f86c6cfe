use chrono::{Datelike, Days, NaiveDate};

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap()
        .checked_sub_days(Days::new(1))
        .unwrap()
}

pub fn next_month_end(date: NaiveDate) -> NaiveDate {
    let year = if date.month() == 12 {
        date.year() + 1
    } else {
        date.year()
    };

    let month = if date.month() == 12 {
        1
    } else {
        date.month() + 1
    };

    last_day_of_month(year, month)
}

/// Resolves an ISO period key to its closing date: a `YYYY-MM` key resolves
/// to the last day of that month, a `YYYY-MM-DD` key to the day itself.
pub fn period_end_date(period: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(period, "%Y-%m-%d") {
        return Some(date);
    }

    let with_day = format!("{}-01", period);
    let first = NaiveDate::parse_from_str(&with_day, "%Y-%m-%d").ok()?;
    Some(last_day_of_month(first.year(), first.month()))
}

/// Advances a period closing date by `steps` buckets. Month keys advance by
/// month-ends, day keys by days. Negative steps walk backwards.
pub fn advance_period_end(date: NaiveDate, monthly: bool, steps: i64) -> NaiveDate {
    if monthly {
        let total = date.year() as i64 * 12 + date.month0() as i64 + steps;
        let year = total.div_euclid(12) as i32;
        let month = total.rem_euclid(12) as u32 + 1;
        last_day_of_month(year, month)
    } else {
        date + chrono::Duration::days(steps)
    }
}

/// True when the key looks like a monthly bucket (`YYYY-MM`).
pub fn is_month_key(period: &str) -> bool {
    period.len() == 7
}
