use chrono::{Datelike, NaiveDate};

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap()
}

/// First day of the month following `date`'s month.
pub fn next_month_start(date: NaiveDate) -> NaiveDate {
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

    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

/// First day of the month `offset` months after `date`'s month.
pub fn add_months(date: NaiveDate, offset: u32) -> NaiveDate {
    let total = date.year() * 12 + date.month0() as i32 + offset as i32;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

/// Whole months from `start`'s month to `end`'s month.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let year_diff = end.year() - start.year();
    let month_diff = end.month() as i32 - start.month() as i32;
    year_diff * 12 + month_diff
}

/// All month starts from `start`'s month through `end`'s month, inclusive.
pub fn month_starts_in_span(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = month_start(start);
    let last = month_start(end);

    while current <= last {
        dates.push(current);
        current = next_month_start(current);
    }

    dates
}

/// Calendar quarter (1-4) of a month number (1-12).
pub fn quarter_of_month(month: u32) -> u32 {
    (month - 1) / 3 + 1
}

/// First day of the calendar quarter containing `date`.
pub fn quarter_start(date: NaiveDate) -> NaiveDate {
    let first_month = (quarter_of_month(date.month()) - 1) * 3 + 1;
    NaiveDate::from_ymd_opt(date.year(), first_month, 1).unwrap()
}

/// Period key in `YYYY-MM` form.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Period key in `YYYY-Qn` form.
pub fn quarter_key(date: NaiveDate) -> String {
    format!("{:04}-Q{}", date.year(), quarter_of_month(date.month()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_next_month_start() {
        assert_eq!(next_month_start(ymd(2023, 1, 15)), ymd(2023, 2, 1));
        assert_eq!(next_month_start(ymd(2023, 12, 31)), ymd(2024, 1, 1));
    }

    #[test]
    fn test_add_months() {
        assert_eq!(add_months(ymd(2023, 1, 20), 0), ymd(2023, 1, 1));
        assert_eq!(add_months(ymd(2023, 11, 1), 3), ymd(2024, 2, 1));
        assert_eq!(add_months(ymd(2023, 1, 1), 24), ymd(2025, 1, 1));
    }

    #[test]
    fn test_months_between() {
        assert_eq!(months_between(ymd(2023, 1, 1), ymd(2023, 12, 1)), 11);
        assert_eq!(months_between(ymd(2022, 11, 5), ymd(2023, 2, 28)), 3);
        assert_eq!(months_between(ymd(2023, 6, 1), ymd(2023, 6, 30)), 0);
    }

    #[test]
    fn test_month_starts_in_span() {
        let span = month_starts_in_span(ymd(2023, 11, 12), ymd(2024, 2, 3));
        assert_eq!(
            span,
            vec![
                ymd(2023, 11, 1),
                ymd(2023, 12, 1),
                ymd(2024, 1, 1),
                ymd(2024, 2, 1)
            ]
        );

        let single = month_starts_in_span(ymd(2023, 5, 9), ymd(2023, 5, 20));
        assert_eq!(single, vec![ymd(2023, 5, 1)]);
    }

    #[test]
    fn test_quarter_helpers() {
        assert_eq!(quarter_of_month(1), 1);
        assert_eq!(quarter_of_month(3), 1);
        assert_eq!(quarter_of_month(4), 2);
        assert_eq!(quarter_of_month(12), 4);

        assert_eq!(quarter_start(ymd(2023, 8, 17)), ymd(2023, 7, 1));
        assert_eq!(quarter_start(ymd(2023, 1, 1)), ymd(2023, 1, 1));
    }

    #[test]
    fn test_period_keys() {
        assert_eq!(month_key(ymd(2023, 3, 14)), "2023-03");
        assert_eq!(quarter_key(ymd(2023, 3, 14)), "2023-Q1");
        assert_eq!(quarter_key(ymd(2023, 10, 1)), "2023-Q4");
    }
}
