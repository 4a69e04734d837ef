// ── Field rules ──
//
// Small composable checks. Each returns the (possibly parsed) value on
// success or the caller's message on failure, so rules chain with
// `and_then` inside `FieldErrors::check`.

use std::ops::RangeInclusive;
use std::str::FromStr;

pub fn required<'a>(value: &'a str, message: &str) -> Result<&'a str, String> {
    if value.trim().is_empty() {
        Err(message.to_owned())
    } else {
        Ok(value)
    }
}

pub fn email<'a>(value: &'a str, message: &str) -> Result<&'a str, String> {
    let valid = value.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain
                .split_once('.')
                .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
            && !domain.ends_with('.')
    }) && !value.chars().any(char::is_whitespace);

    if valid { Ok(value) } else { Err(message.to_owned()) }
}

pub fn min_len<'a>(value: &'a str, min: usize, message: &str) -> Result<&'a str, String> {
    if value.chars().count() >= min {
        Ok(value)
    } else {
        Err(message.to_owned())
    }
}

/// Parse a number strictly greater than zero.
pub fn positive_number<T>(value: &str, message: &str) -> Result<T, String>
where
    T: FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(message.to_owned()),
    }
}

pub fn non_negative_integer(value: &str, message: &str) -> Result<u64, String> {
    value.trim().parse::<u64>().map_err(|_| message.to_owned())
}

/// Digits with an optional leading `+`, 8 to 15 digits long.
pub fn phone<'a>(value: &'a str, message: &str) -> Result<&'a str, String> {
    let digits = value.strip_prefix('+').unwrap_or(value);
    let valid = (8..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit());
    if valid { Ok(value) } else { Err(message.to_owned()) }
}

/// Require `value` to equal `other` (password confirmation).
pub fn matches<'a>(value: &'a str, other: &str, message: &str) -> Result<&'a str, String> {
    if value == other {
        Ok(value)
    } else {
        Err(message.to_owned())
    }
}

pub fn in_range(value: &str, range: RangeInclusive<f64>, message: &str) -> Result<f64, String> {
    match value.trim().parse::<f64>() {
        Ok(n) if range.contains(&n) => Ok(n),
        _ => Err(message.to_owned()),
    }
}

/// Apply `rule` only when the field is filled in.
pub fn optional<T>(
    value: &str,
    rule: impl FnOnce(&str) -> Result<T, String>,
) -> Result<Option<T>, String> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        rule(value).map(Some)
    }
}
