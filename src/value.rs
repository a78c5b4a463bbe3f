//! SQL 参数值类型。

use std::borrow::Cow;

/// 绑定到占位符上的参数值。
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    String(Cow<'static, str>),
    Bytes(Vec<u8>),
    DateTime(time::OffsetDateTime),
}

impl SqlValue {
    /// 将 `Option<T>` 映射为 `SqlValue`：`None => Null`，`Some(v) => v.into()`。
    pub fn from_option<T: Into<SqlValue>>(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// 数值视图，字符串会尝试按浮点解析。
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::I64(v) => Some(*v as f64),
            Self::U64(v) => Some(*v as f64),
            Self::F64(v) => Some(*v),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// 文本形式，IN 去重等按文本比较的场合使用。
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(true) => "1".to_string(),
            Self::Bool(false) => "0".to_string(),
            Self::I64(v) => v.to_string(),
            Self::U64(v) => v.to_string(),
            Self::F64(v) => format_number(*v),
            Self::String(s) => s.to_string(),
            Self::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            Self::DateTime(dt) => crate::datetime::format_datetime(*dt),
        }
    }
}

/// 整数值的浮点数不带小数部分输出（`3.0` → `3`）。
pub(crate) fn format_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

impl From<()> for SqlValue {
    fn from(_: ()) -> Self {
        Self::Null
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

macro_rules! impl_from_int {
    ($variant:ident as $target:ty: $($t:ty),*) => {
        $(
            impl From<$t> for SqlValue {
                fn from(v: $t) -> Self {
                    Self::$variant(v as $target)
                }
            }
        )*
    };
}

impl_from_int!(I64 as i64: i8, i16, i32, i64);
impl_from_int!(U64 as u64: u8, u16, u32, u64);

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        Self::F64(v as f64)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::String(Cow::Owned(v))
    }
}

impl From<&'static str> for SqlValue {
    fn from(v: &'static str) -> Self {
        Self::String(Cow::Borrowed(v))
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<time::OffsetDateTime> for SqlValue {
    fn from(v: time::OffsetDateTime) -> Self {
        Self::DateTime(v)
    }
}

#[cfg(test)]
mod tests {
    use super::{SqlValue, format_number};
    use pretty_assertions::assert_eq;

    #[test]
    fn from_option_maps_none_to_null() {
        assert_eq!(SqlValue::from_option(Some(123_i64)), SqlValue::I64(123));
        assert_eq!(SqlValue::from_option::<i64>(None), SqlValue::Null);
    }

    #[test]
    fn text_form_for_comparison() {
        assert_eq!(SqlValue::from(1_i32).to_text(), "1");
        assert_eq!(SqlValue::from("1").to_text(), "1");
        assert_eq!(SqlValue::from(2.5).to_text(), "2.5");
        assert_eq!(SqlValue::from(true).to_text(), "1");
        assert_eq!(SqlValue::Null.to_text(), "");
    }

    #[test]
    fn integral_floats_drop_fraction() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(0.25), "0.25");
    }

    #[test]
    fn numeric_view_parses_strings() {
        assert_eq!(SqlValue::from(" 7 ").as_f64(), Some(7.0));
        assert_eq!(SqlValue::from("x").as_f64(), None);
        assert_eq!(SqlValue::Null.as_f64(), None);
    }
}
