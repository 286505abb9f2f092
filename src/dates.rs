//! Date helpers for domain prompts
//!
//! The Indian financial year runs April 1st through March 31st. Customers
//! say "current year" meaning the running financial year and "last year"
//! meaning the previous one, so every domain prompt carries both ranges.

use chrono::{Datelike, NaiveDate, Utc};

const DATE_FMT: &str = "%m/%d/%Y";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinancialYear {
    pub start: String,
    pub end: String,
}

fn fy_bounds_for(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let (start_year, end_year) = if date.month() <= 3 {
        (date.year() - 1, date.year())
    } else {
        (date.year(), date.year() + 1)
    };

    // April 1 / March 31 always exist, so the unwraps cannot fire.
    (
        NaiveDate::from_ymd_opt(start_year, 4, 1).unwrap(),
        NaiveDate::from_ymd_opt(end_year, 3, 31).unwrap(),
    )
}

pub fn today() -> String {
    Utc::now().date_naive().format(DATE_FMT).to_string()
}

/// Running financial year for a given date.
pub fn financial_year_of(date: NaiveDate) -> FinancialYear {
    let (start, end) = fy_bounds_for(date);
    FinancialYear {
        start: start.format(DATE_FMT).to_string(),
        end: end.format(DATE_FMT).to_string(),
    }
}

/// Financial year immediately before the running one.
pub fn previous_financial_year_of(date: NaiveDate) -> FinancialYear {
    let (start, _) = fy_bounds_for(date);
    let prior = start.pred_opt().unwrap_or(start);
    financial_year_of(prior)
}

pub fn current_financial_year() -> FinancialYear {
    financial_year_of(Utc::now().date_naive())
}

pub fn previous_financial_year() -> FinancialYear {
    previous_financial_year_of(Utc::now().date_naive())
}
