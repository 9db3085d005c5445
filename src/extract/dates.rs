//! Calendar date parsing for OCR'd field values.
//!
//! Accepts numeric dates (`16-06-2006`, `16/6/06`, `2006.06.16`) and dates
//! with a spelled month (`16 June 2006`, `June 16th, 2006`, `16-Jun-2006`).
//! Numeric day/month ambiguity is settled by [`DateOrder`]; a spelled month
//! is unambiguous. Parsing is strict: any token that is not a number, a month
//! name, a weekday or a filler word rejects the whole input.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// How to read an all-numeric `a-b-year` date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    DayFirst,
    MonthFirst,
}

/// `d[d]/-d[d]/-dddd` anywhere in a string.
static NUMERIC_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}[/-]\d{1,2}[/-]\d{4}").unwrap());

/// `day month-name year` anywhere in a string.
static SPELLED_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}\s+\w+\s+\d{4}").unwrap());

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const FILLER: [&str; 5] = ["of", "on", "at", "and", "the"];

pub fn parse_day_first(input: &str) -> Option<NaiveDate> {
    parse_date(input, DateOrder::DayFirst)
}

pub fn parse_month_first(input: &str) -> Option<NaiveDate> {
    parse_date(input, DateOrder::MonthFirst)
}

/// First `d[d]/-d[d]/-dddd` token in `text`.
pub fn find_numeric_date(text: &str) -> Option<&str> {
    NUMERIC_DATE.find(text).map(|m| m.as_str())
}

/// First `day month-name year` token in `text`.
pub fn find_spelled_date(text: &str) -> Option<&str> {
    SPELLED_DATE.find(text).map(|m| m.as_str())
}

/// Parse a complete date string.
pub fn parse_date(input: &str, order: DateOrder) -> Option<NaiveDate> {
    let mut numbers: Vec<(u32, usize)> = Vec::with_capacity(3);
    let mut month: Option<u32> = None;

    for token in input
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '-' | '/' | '.' | '–'))
        .filter(|t| !t.is_empty())
    {
        match classify(token)? {
            Token::Number(value, width) => numbers.push((value, width)),
            Token::Month(m) => {
                if month.replace(m).is_some() {
                    return None;
                }
            }
            Token::Skip => {}
        }
    }

    let (year, month, day) = match month {
        Some(month) => {
            let [a, b] = numbers[..] else {
                return None;
            };
            // Whichever number looks like a year is the year; else day comes first.
            if is_year_like(a) && !is_year_like(b) {
                (a, month, b.0)
            } else {
                (b, month, a.0)
            }
        }
        None => {
            let [a, b, c] = numbers[..] else {
                return None;
            };
            if is_year_like(a) {
                let (m, d) = swap_if_impossible(b.0, c.0);
                (a, m, d)
            } else {
                let (m, d) = match order {
                    DateOrder::DayFirst => swap_if_impossible(b.0, a.0),
                    DateOrder::MonthFirst => swap_if_impossible(a.0, b.0),
                };
                (c, m, d)
            }
        }
    };

    NaiveDate::from_ymd_opt(expand_year(year)?, month, day)
}

enum Token {
    Number(u32, usize),
    Month(u32),
    Skip,
}

fn classify(token: &str) -> Option<Token> {
    let digits = token.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        let suffix = token[digits.len()..].to_ascii_lowercase();
        if !matches!(suffix.as_str(), "" | "st" | "nd" | "rd" | "th") || digits.len() > 4 {
            return None;
        }
        return Some(Token::Number(digits.parse().ok()?, digits.len()));
    }

    let word = token.to_lowercase();
    if FILLER.contains(&word.as_str()) {
        return Some(Token::Skip);
    }
    if word.len() >= 3 && WEEKDAYS.iter().any(|d| d.starts_with(word.as_str())) {
        return Some(Token::Skip);
    }
    if word.len() >= 3 {
        if let Some(idx) = MONTHS.iter().position(|m| m.starts_with(word.as_str())) {
            return Some(Token::Month(idx as u32 + 1));
        }
    }
    None
}

fn is_year_like((value, width): (u32, usize)) -> bool {
    width >= 3 || value > 31
}

/// Returns `(month, day)`, swapping when the month slot cannot be a month.
fn swap_if_impossible(month: u32, day: u32) -> (u32, u32) {
    if month > 12 && day <= 12 {
        (day, month)
    } else {
        (month, day)
    }
}

/// Two-digit years `00`-`49` are read as 20xx, `50`-`99` as 19xx.
const TWO_DIGIT_PIVOT: i32 = 50;

fn expand_year((value, width): (u32, usize)) -> Option<i32> {
    let value = i32::try_from(value).ok()?;
    if width > 2 {
        return Some(value);
    }
    Some(if value < TWO_DIGIT_PIVOT {
        2000 + value
    } else {
        1900 + value
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_first_numeric() {
        assert_eq!(parse_day_first("16-06-2006"), Some(ymd(2006, 6, 16)));
        assert_eq!(parse_day_first("01-02-1990"), Some(ymd(1990, 2, 1)));
        assert_eq!(parse_day_first("1/2/1990"), Some(ymd(1990, 2, 1)));
        assert_eq!(parse_day_first("16.06.2006"), Some(ymd(2006, 6, 16)));
    }

    #[test]
    fn test_month_first_numeric() {
        assert_eq!(parse_month_first("01-02-1990"), Some(ymd(1990, 1, 2)));
    }

    #[test]
    fn test_impossible_month_is_swapped() {
        assert_eq!(parse_month_first("16-06-2006"), Some(ymd(2006, 6, 16)));
        assert_eq!(parse_day_first("06-16-2006"), Some(ymd(2006, 6, 16)));
    }

    #[test]
    fn test_year_first() {
        assert_eq!(parse_day_first("2006-06-16"), Some(ymd(2006, 6, 16)));
    }

    #[test]
    fn test_spelled_month() {
        assert_eq!(parse_month_first("16 June 2006"), Some(ymd(2006, 6, 16)));
        assert_eq!(parse_day_first("16 June 2006"), Some(ymd(2006, 6, 16)));
        assert_eq!(parse_month_first("June 16th, 2006"), Some(ymd(2006, 6, 16)));
        assert_eq!(parse_day_first("3 Sept 2019"), Some(ymd(2019, 9, 3)));
        assert_eq!(parse_day_first("16-Jun-2006"), Some(ymd(2006, 6, 16)));
        assert_eq!(parse_day_first("Friday 16 June 2006"), Some(ymd(2006, 6, 16)));
    }

    #[test]
    fn test_two_digit_year() {
        assert_eq!(parse_day_first("16/06/06"), Some(ymd(2006, 6, 16)));
        assert_eq!(parse_day_first("16/06/49"), Some(ymd(2049, 6, 16)));
        assert_eq!(parse_day_first("16/06/50"), Some(ymd(1950, 6, 16)));
        assert_eq!(parse_day_first("01-02-75"), Some(ymd(1975, 2, 1)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_day_first(""), None);
        assert_eq!(parse_day_first("unknown"), None);
        assert_eq!(parse_day_first("31-02-2001"), None);
        assert_eq!(parse_day_first("16 June"), None);
        assert_eq!(parse_day_first("01-02-1990 Istanbul"), None);
        assert_eq!(parse_day_first("12345-01-01"), None);
    }

    #[test]
    fn test_find_date_tokens() {
        assert_eq!(
            find_numeric_date("born on 01/02/1990 in Izmir"),
            Some("01/02/1990")
        );
        assert_eq!(find_numeric_date("no date here 2020"), None);
        assert_eq!(
            find_spelled_date("Ankara  Turkey  3 March 2015 (approx)"),
            Some("3 March 2015")
        );
    }
}
