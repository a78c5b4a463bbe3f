//! 原始 SQL 表达式：原样输出，既不绑定也不转义。

use std::fmt;

/// 一段被显式标记为原始 SQL 的片段。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expr {
    sql: String,
}

impl Expr {
    pub fn raw(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.sql
    }

    pub fn into_string(self) -> String {
        self.sql
    }
}

/// `Expr::raw` 的简写。
pub fn raw(sql: impl Into<String>) -> Expr {
    Expr::raw(sql)
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

impl From<&str> for Expr {
    fn from(v: &str) -> Self {
        Self::raw(v)
    }
}

impl From<String> for Expr {
    fn from(v: String) -> Self {
        Self::raw(v)
    }
}

#[cfg(test)]
mod tests {
    use super::{Expr, raw};

    #[test]
    fn raw_keeps_text_verbatim() {
        let e = raw("score + 1");
        assert_eq!(e.as_str(), "score + 1");
        assert_eq!(e.to_string(), "score + 1");
        assert_eq!(Expr::from("a = 1"), Expr::raw(String::from("a = 1")));
    }
}
