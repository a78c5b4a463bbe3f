//! 外部协作者：字段类型查询与标识符引用。
//!
//! 编译器只通过这两个 trait 了解表结构与方言引用规则，
//! 不做任何在线 schema 校验。

use std::collections::HashMap;

use crate::flavor::Flavor;

/// 字段类型信息来源。
pub trait SchemaProvider: Send + Sync {
    /// 返回字段的声明类型（如 `int(11)`、`datetime`、`json`），未知时返回 `None`。
    fn field_type(&self, table: &str, column: &str) -> Option<String>;

    /// 表的全部字段名；未知表返回空列表。
    fn table_fields(&self, table: &str) -> Vec<String>;
}

/// 没有任何 schema 信息。
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSchema;

impl SchemaProvider for NoSchema {
    fn field_type(&self, _table: &str, _column: &str) -> Option<String> {
        None
    }

    fn table_fields(&self, _table: &str) -> Vec<String> {
        Vec::new()
    }
}

/// 内存中的静态 schema，字段顺序按声明顺序保留。
#[derive(Debug, Clone, Default)]
pub struct StaticSchema {
    tables: HashMap<String, Vec<(String, String)>>,
}

impl StaticSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// 声明一张表及其 (字段, 类型) 列表。
    pub fn table<I, C, T>(mut self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = (C, T)>,
        C: Into<String>,
        T: Into<String>,
    {
        self.tables.insert(
            name.into(),
            columns
                .into_iter()
                .map(|(c, t)| (c.into(), t.into()))
                .collect(),
        );
        self
    }
}

impl SchemaProvider for StaticSchema {
    fn field_type(&self, table: &str, column: &str) -> Option<String> {
        self.tables
            .get(table)?
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, t)| t.clone())
    }

    fn table_fields(&self, table: &str) -> Vec<String> {
        self.tables
            .get(table)
            .map(|cols| cols.iter().map(|(c, _)| c.clone()).collect())
            .unwrap_or_default()
    }
}

/// 标识符引用与表别名。
pub trait IdentifierResolver: Send + Sync {
    fn quote_identifier(&self, name: &str) -> String;

    /// 表的默认别名，查询选项中的别名优先。
    fn resolve_alias(&self, _table: &str) -> Option<String> {
        None
    }
}

/// 原样输出标识符。
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainResolver;

impl IdentifierResolver for PlainResolver {
    fn quote_identifier(&self, name: &str) -> String {
        name.trim().to_string()
    }
}

/// 按方言为标识符加引号。
///
/// - `a.b` 按段分别引用，`*` 段保持原样
/// - `col->a.b` 渲染为方言的 JSON 取值表达式
/// - 含括号、空白、引号的名字（函数调用、表达式、已引用的名字）原样输出
#[derive(Debug, Clone, Default)]
pub struct FlavorResolver {
    flavor: Flavor,
    aliases: HashMap<String, String>,
}

impl FlavorResolver {
    pub fn new(flavor: Flavor) -> Self {
        Self {
            flavor,
            aliases: HashMap::new(),
        }
    }

    /// 为表声明默认别名。
    pub fn alias(mut self, table: impl Into<String>, alias: impl Into<String>) -> Self {
        self.aliases.insert(table.into(), alias.into());
        self
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }
}

impl IdentifierResolver for FlavorResolver {
    fn quote_identifier(&self, name: &str) -> String {
        let name = name.trim();
        if name.is_empty() || name == "*" {
            return name.to_string();
        }
        if let Some((col, path)) = name.split_once("->") {
            let col = self.quote_identifier(col);
            return self.flavor.json_extract(&col, path.trim());
        }
        if name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '`' | '"' | '\'' | ','))
        {
            return name.to_string();
        }
        name.split('.')
            .map(|seg| {
                if seg == "*" {
                    seg.to_string()
                } else {
                    self.flavor.quote(seg)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    fn resolve_alias(&self, table: &str) -> Option<String> {
        self.aliases.get(table).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn static_schema_lookup() {
        let schema = StaticSchema::new().table("user", [("id", "int(11)"), ("name", "varchar(32)")]);
        assert_eq!(schema.field_type("user", "id").as_deref(), Some("int(11)"));
        assert_eq!(schema.field_type("user", "nope"), None);
        assert_eq!(schema.field_type("other", "id"), None);
        assert_eq!(schema.table_fields("user"), vec!["id", "name"]);
        assert!(schema.table_fields("other").is_empty());
    }

    #[test]
    fn flavor_resolver_quotes_segments() {
        let mysql = FlavorResolver::new(Flavor::MySQL);
        assert_eq!(mysql.quote_identifier("name"), "`name`");
        assert_eq!(mysql.quote_identifier("u.name"), "`u`.`name`");
        assert_eq!(mysql.quote_identifier("u.*"), "`u`.*");
        assert_eq!(mysql.quote_identifier("*"), "*");
        assert_eq!(mysql.quote_identifier("count(id)"), "count(id)");
        assert_eq!(mysql.quote_identifier("`done`"), "`done`");

        let pg = FlavorResolver::new(Flavor::PostgreSQL);
        assert_eq!(pg.quote_identifier("u.name"), "\"u\".\"name\"");
    }

    #[test]
    fn flavor_resolver_json_path() {
        let mysql = FlavorResolver::new(Flavor::MySQL);
        assert_eq!(
            mysql.quote_identifier("info->addr.city"),
            "json_extract(`info`, '$.addr.city')"
        );
    }

    #[test]
    fn plain_resolver_is_verbatim() {
        assert_eq!(PlainResolver.quote_identifier(" a.b "), "a.b");
        assert_eq!(PlainResolver.resolve_alias("user"), None);
        assert_eq!(
            FlavorResolver::new(Flavor::MySQL).alias("user", "u").resolve_alias("user").as_deref(),
            Some("u")
        );
    }
}
