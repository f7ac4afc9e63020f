use chrono::NaiveDate;

/// US long-form date, e.g. "October 18, 2026"
pub fn long_form_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}
