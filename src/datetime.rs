//! 日期时间转换：按字段声明类型把时间条件的值规范化后再绑定。

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time};

use crate::options::QueryOptions;
use crate::value::SqlValue;

/// 字段类型所属的时间族。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeFamily {
    DateTime,
    Date,
    Other,
}

impl TimeFamily {
    fn of(ty: &str) -> Self {
        let ty = ty.to_ascii_lowercase();
        if ty.contains("datetime") || ty.contains("timestamp") {
            Self::DateTime
        } else if ty.contains("date") {
            Self::Date
        } else {
            Self::Other
        }
    }
}

pub(crate) fn format_datetime(dt: OffsetDateTime) -> String {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    dt.format(fmt)
        .unwrap_or_else(|_| dt.unix_timestamp().to_string())
}

pub(crate) fn format_date(dt: OffsetDateTime) -> String {
    let fmt = format_description!("[year]-[month]-[day]");
    dt.format(fmt)
        .unwrap_or_else(|_| dt.unix_timestamp().to_string())
}

/// 解析自由格式的时间字符串，结果统一为 UTC。
///
/// 支持 `YYYY-MM-DD[ HH:MM[:SS]]`、`YYYY/MM/DD[ HH:MM:SS]`、RFC 3339、整数时间戳，
/// 以及 `now` / `today` / `yesterday` / `tomorrow` 和 `+N unit` / `-N unit`。
pub fn parse_datetime(s: &str, now: OffsetDateTime) -> Option<OffsetDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(dt) = parse_relative(s, now) {
        return Some(dt);
    }
    if let Ok(epoch) = s.parse::<i64>() {
        return OffsetDateTime::from_unix_timestamp(epoch).ok();
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(dt.to_offset(time::UtcOffset::UTC));
    }

    let datetimes = [
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]"),
        format_description!("[year]/[month]/[day] [hour]:[minute]:[second]"),
    ];
    for fmt in datetimes {
        if let Ok(dt) = PrimitiveDateTime::parse(s, fmt) {
            return Some(dt.assume_utc());
        }
    }

    let dates = [
        format_description!("[year]-[month]-[day]"),
        format_description!("[year]/[month]/[day]"),
    ];
    for fmt in dates {
        if let Ok(d) = Date::parse(s, fmt) {
            return Some(d.midnight().assume_utc());
        }
    }
    None
}

fn parse_relative(s: &str, now: OffsetDateTime) -> Option<OffsetDateTime> {
    let lower = s.to_ascii_lowercase();
    let midnight = now.replace_time(Time::MIDNIGHT);
    match lower.as_str() {
        "now" => return Some(now),
        "today" => return Some(midnight),
        "yesterday" => return Some(midnight - Duration::days(1)),
        "tomorrow" => return Some(midnight + Duration::days(1)),
        _ => {}
    }

    let (sign, rest) = match lower.as_bytes().first()? {
        b'+' => (1, &lower[1..]),
        b'-' => (-1, &lower[1..]),
        _ => return None,
    };
    let mut parts = rest.split_whitespace();
    let n: i64 = parts.next()?.parse().ok()?;
    let unit = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let unit_secs: i64 = match unit.trim_end_matches('s') {
        "sec" | "second" => 1,
        "min" | "minute" => 60,
        "hour" => 3_600,
        "day" => 86_400,
        "week" => 604_800,
        _ => return None,
    };
    // 溢出时视为无法解析，由调用方原样绑定。
    let secs = n.checked_mul(sign)?.checked_mul(unit_secs)?;
    now.checked_add(Duration::seconds(secs))
}

/// 按字段类型转换时间值：
/// - `datetime` / `timestamp` 族 → `YYYY-MM-DD HH:MM:SS`
/// - `date` 族 → `YYYY-MM-DD`
/// - 其它已知类型 → 整数时间戳
///
/// 类型未知或字符串无法解析时原样返回。
pub fn coerce_datetime(field_type: Option<&str>, value: &SqlValue, now: OffsetDateTime) -> SqlValue {
    let Some(ty) = field_type else {
        return value.clone();
    };
    let instant = match value {
        SqlValue::String(s) => parse_datetime(s, now),
        SqlValue::I64(v) => OffsetDateTime::from_unix_timestamp(*v).ok(),
        SqlValue::U64(v) => i64::try_from(*v)
            .ok()
            .and_then(|v| OffsetDateTime::from_unix_timestamp(v).ok()),
        SqlValue::DateTime(dt) => Some(*dt),
        _ => None,
    };
    let Some(instant) = instant else {
        return value.clone();
    };
    match TimeFamily::of(ty) {
        TimeFamily::DateTime => format_datetime(instant).into(),
        TimeFamily::Date => format_date(instant).into(),
        TimeFamily::Other => SqlValue::I64(instant.unix_timestamp()),
    }
}

/// 字段所属的表：`t.field` 中的 `t` 先按别名反查表名，否则使用主表。
pub(crate) fn owning_table<'f>(options: &QueryOptions, field: &'f str) -> (Option<String>, &'f str) {
    match field.split_once('.') {
        Some((qualifier, column)) => {
            let table = options
                .alias
                .iter()
                .find(|(_, alias)| alias.as_str() == qualifier)
                .map(|(table, _)| table.clone())
                .or_else(|| options.table.table_for_alias(qualifier).map(str::to_string))
                .or_else(|| {
                    options
                        .join
                        .iter()
                        .find_map(|j| j.table.table_for_alias(qualifier).map(str::to_string))
                })
                .unwrap_or_else(|| qualifier.to_string());
            (Some(table), column)
        }
        None => (options.table.primary().map(str::to_string), field),
    }
}
