//! Repayment schedule generation

use chrono::{Months, NaiveDate};
use thiserror::Error;

pub const MAX_TERM_MONTHS: i32 = 60;

#[derive(Error, Debug, PartialEq)]
pub enum ScheduleError {
    #[error("Term must be between 1 and 60 months")]
    InvalidTerm,

    #[error("Amount must be a positive number")]
    InvalidAmount,

    #[error("Interest rate must be within [0, 100]")]
    InvalidRate,

    #[error("Due date out of range")]
    DateOutOfRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledInstallment {
    pub installment_number: i32,
    pub amount: f64,
    pub due_date: NaiveDate,
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Principal plus simple annual interest over the term, in cents
pub fn total_repayable(amount: f64, annual_rate_percent: f64, term_months: i32) -> f64 {
    round_cents(amount * (1.0 + annual_rate_percent / 100.0 * term_months as f64 / 12.0))
}

/// Equal monthly installments starting one month after `start`. The last
/// installment absorbs the rounding remainder so the schedule sums to
/// [`total_repayable`].
pub fn build_schedule(
    amount: f64,
    annual_rate_percent: f64,
    term_months: i32,
    start: NaiveDate,
) -> Result<Vec<ScheduledInstallment>, ScheduleError> {
    if !(1..=MAX_TERM_MONTHS).contains(&term_months) {
        return Err(ScheduleError::InvalidTerm);
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ScheduleError::InvalidAmount);
    }
    if !annual_rate_percent.is_finite() || !(0.0..=100.0).contains(&annual_rate_percent) {
        return Err(ScheduleError::InvalidRate);
    }

    let total = total_repayable(amount, annual_rate_percent, term_months);
    let regular = round_cents(total / term_months as f64);
    let last = round_cents(total - regular * (term_months - 1) as f64);

    (1..=term_months)
        .map(|n| {
            let due_date = start
                .checked_add_months(Months::new(n as u32))
                .ok_or(ScheduleError::DateOutOfRange)?;
            Ok(ScheduledInstallment {
                installment_number: n,
                amount: if n == term_months { last } else { regular },
                due_date,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_schedule_sums_to_total() {
        let schedule = build_schedule(1000.0, 10.0, 3, date(2026, 1, 15)).unwrap();
        let total = total_repayable(1000.0, 10.0, 3);

        assert_eq!(total, 1025.0);
        assert_eq!(schedule.len(), 3);
        let sum: f64 = schedule.iter().map(|i| i.amount).sum();
        assert!((sum - total).abs() < 0.005);
    }

    #[test]
    fn test_last_installment_absorbs_rounding() {
        let schedule = build_schedule(100.0, 0.0, 3, date(2026, 1, 1)).unwrap();
        assert_eq!(schedule[0].amount, 33.33);
        assert_eq!(schedule[1].amount, 33.33);
        assert_eq!(schedule[2].amount, 33.34);
    }

    #[test]
    fn test_monthly_due_dates_clamp_to_month_end() {
        let schedule = build_schedule(300.0, 5.0, 3, date(2026, 1, 31)).unwrap();
        assert_eq!(schedule[0].due_date, date(2026, 2, 28));
        assert_eq!(schedule[1].due_date, date(2026, 3, 31));
        assert_eq!(schedule[2].due_date, date(2026, 4, 30));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let start = date(2026, 1, 1);
        assert_eq!(build_schedule(100.0, 5.0, 0, start), Err(ScheduleError::InvalidTerm));
        assert_eq!(build_schedule(100.0, 5.0, 61, start), Err(ScheduleError::InvalidTerm));
        assert_eq!(build_schedule(0.0, 5.0, 12, start), Err(ScheduleError::InvalidAmount));
        assert_eq!(build_schedule(100.0, 101.0, 12, start), Err(ScheduleError::InvalidRate));
    }
}
