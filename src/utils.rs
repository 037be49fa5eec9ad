use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::error::{EdfError, Result};
use crate::fields::Field;

/// 将字符串转换为 7-bit ASCII，非 ASCII 替换为 '_'
pub fn to_ascii(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect()
}

/// Decodes a raw slot and strips the surrounding padding
pub fn trim_padding(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

/// Left-aligns `s` in a slot of exactly `width` bytes: longer text is cut,
/// shorter text is padded with spaces.
pub fn pad_ascii(s: &str, width: usize) -> Vec<u8> {
    let mut slot = to_ascii(s).into_bytes();
    slot.truncate(width);
    slot.resize(width, b' ');
    slot
}

/// Formats an integer into a `width` byte slot
pub fn format_int<T: std::fmt::Display>(value: T, width: usize) -> Vec<u8> {
    pad_ascii(&value.to_string(), width)
}

/// Formats a float into a `width` byte slot.
///
/// Uses the shortest text that parses back to the same value. When that text
/// does not fit, fractional digits are dropped (with rounding) until it does;
/// an integer part wider than the slot is cut.
pub fn format_float(value: f64, width: usize) -> Vec<u8> {
    let mut text = value.to_string();

    if text.len() > width {
        if let Some(dot) = text.find('.') {
            if dot < width {
                let precision = width - dot - 1;
                text = format!("{:.*}", precision, value);
                if text.contains('.') {
                    text = text.trim_end_matches('0').trim_end_matches('.').to_string();
                }
            }
        }
    }

    pad_ascii(&text, width)
}

/// 非本地化的整数解析（避免受系统locale影响）
pub fn parse_int<T: FromStr>(field: Field, text: &str) -> Result<T> {
    text.trim().parse::<T>().map_err(|_| EdfError::InvalidNumber {
        field: field.name,
        text: text.to_string(),
    })
}

/// 非本地化的浮点数解析，小数点只接受 '.'
pub fn parse_float(field: Field, text: &str) -> Result<f64> {
    let invalid = || EdfError::InvalidNumber {
        field: field.name,
        text: text.to_string(),
    };

    let value = text.trim().parse::<f64>().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }
    Ok(value)
}

/// Parses the `dd.mm.yy` date and `hh.mm.ss` time slots into one instant.
///
/// Day always precedes month. Two-digit years 85-99 are 19xx, 00-84 are 20xx.
pub fn parse_start_datetime(date: &str, time: &str) -> Result<NaiveDateTime> {
    let invalid = || EdfError::InvalidStartDateTime {
        date: date.to_string(),
        time: time.to_string(),
    };

    let [day, month, yy] = split_dotted(date).ok_or_else(invalid)?;
    let [hour, minute, second] = split_dotted(time).ok_or_else(invalid)?;
    if yy > 99 {
        return Err(invalid());
    }
    let year = if yy > 84 { 1900 + yy } else { 2000 + yy };

    NaiveDate::from_ymd_opt(year as i32, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .ok_or_else(invalid)
}

fn split_dotted(s: &str) -> Option<[u32; 3]> {
    let mut parts = s.trim().split('.');
    let mut out = [0u32; 3];
    for slot in out.iter_mut() {
        let part = parts.next()?.trim();
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *slot = part.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(out)
}

/// Offset of `seconds` rounded to whole milliseconds, `None` when it does
/// not fit a [`Duration`]
pub fn millis(seconds: f64) -> Option<Duration> {
    let ms = (seconds * 1000.0).round();
    // i64::MAX as f64 rounds up to 2^63, hence the strict bound
    if !ms.is_finite() || ms < i64::MIN as f64 || ms >= i64::MAX as f64 {
        return None;
    }
    Duration::try_milliseconds(ms as i64)
}

/// Renders an instant as `dd.mm.yyyy HH:MM:SS.fff`
pub fn format_timestamp(instant: &NaiveDateTime) -> String {
    instant.format("%d.%m.%Y %H:%M:%S%.3f").to_string()
}
