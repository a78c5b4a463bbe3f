//! 子句编译：表、字段、JOIN、GROUP、HAVING、ORDER、LIMIT、LOCK、UNION 等。
//!
//! 每个函数返回可直接填入语句模板的片段，除表与字段外都带前导空格，
//! 子句为空时返回空字符串。

use crate::compiler::Compiler;
use crate::context::QueryContext;
use crate::error::{CompileError, Result};
use crate::options::{FieldItem, FieldSpec, Join, Limit, Lock, OrderItem, TableSpec, Union, UnionItem};

/// 排序方向，只接受 `ASC` / `DESC`（不区分大小写），其它值丢弃。
fn sort_dir(sort: Option<&str>) -> &'static str {
    match sort.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
        Some("ASC") => " ASC",
        Some("DESC") => " DESC",
        _ => "",
    }
}

impl Compiler {
    pub(crate) fn parse_table(&self, ctx: &QueryContext, table: &TableSpec) -> String {
        let options = ctx.options();
        table
            .0
            .iter()
            .map(|t| {
                let alias = t
                    .alias
                    .clone()
                    .or_else(|| options.alias.get(&t.name).cloned())
                    .or_else(|| self.resolver().resolve_alias(&t.name));
                match alias {
                    Some(alias) => format!("{} {}", self.quote(&t.name), self.quote(&alias)),
                    None => self.quote(&t.name),
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    pub(crate) fn parse_field(&self, field: &FieldSpec) -> String {
        let items = match field {
            FieldSpec::List(items) if !items.is_empty() => items,
            _ => return "*".to_string(),
        };
        items
            .iter()
            .map(|item| match item {
                FieldItem::Name(name) => self.quote(name),
                FieldItem::Alias { name, alias } => {
                    format!("{} AS {}", self.quote(name), self.quote(alias))
                }
                FieldItem::Raw(e) => e.to_string(),
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// `a=b` 形式的连接条件两侧分别引用，其它条件原样输出。
    pub(crate) fn parse_join(&self, ctx: &QueryContext, joins: &[Join]) -> String {
        let mut out = String::new();
        for join in joins {
            out.push_str(&format!(
                " {} JOIN {}",
                join.kind.as_str(),
                self.parse_table(ctx, &join.table)
            ));
            let on: Vec<String> = join
                .on
                .iter()
                .map(|cond| match cond.split_once('=') {
                    Some((l, r))
                        if !l.ends_with(['<', '>', '!'])
                            && !r.starts_with('=')
                            && !l.trim().is_empty()
                            && !r.trim().is_empty() =>
                    {
                        format!("{} = {}", self.quote(l), self.quote(r))
                    }
                    _ => cond.clone(),
                })
                .collect();
            if !on.is_empty() {
                out.push_str(" ON ");
                out.push_str(&on.join(" AND "));
            }
        }
        out
    }

    pub(crate) fn parse_group(&self, group: &[String]) -> String {
        if group.is_empty() {
            return String::new();
        }
        let fields: Vec<String> = group.iter().map(|g| self.quote(g)).collect();
        format!(" GROUP BY {}", fields.join(","))
    }

    pub(crate) fn parse_having(&self, having: &str) -> String {
        if having.trim().is_empty() {
            String::new()
        } else {
            format!(" HAVING {having}")
        }
    }

    pub(crate) fn parse_order(&self, ctx: &mut QueryContext, order: &[OrderItem]) -> Result<String> {
        let mut items = Vec::with_capacity(order.len());
        for item in order {
            match item {
                OrderItem::Raw(e) => items.push(e.to_string()),
                OrderItem::Rand => items.push(self.flavor().rand().to_string()),
                OrderItem::Field { field, sort } => {
                    check_order_field(field)?;
                    items.push(format!("{}{}", self.quote(field), sort_dir(sort.as_deref())));
                }
                OrderItem::Values {
                    field,
                    values,
                    sort,
                } => {
                    check_order_field(field)?;
                    let ty = self.bind_type(ctx, field);
                    let base = format!("data__{}", field.replace('.', "_"));
                    let mut sql = format!("field({}", self.quote(field));
                    for (k, v) in values.iter().enumerate() {
                        let name = ctx.bind(&format!("{base}{k}"), v.clone(), ty);
                        sql.push_str(&format!(",:{name}"));
                    }
                    sql.push(')');
                    sql.push_str(sort_dir(sort.as_deref()));
                    items.push(sql);
                }
            }
        }
        if items.is_empty() {
            Ok(String::new())
        } else {
            Ok(format!(" ORDER BY {}", items.join(",")))
        }
    }

    pub(crate) fn parse_limit(&self, limit: Option<&Limit>) -> String {
        limit
            .map(|l| self.flavor().limit(l.offset, l.length))
            .unwrap_or_default()
    }

    pub(crate) fn parse_lock(&self, lock: &Lock) -> String {
        match lock {
            Lock::None => String::new(),
            Lock::ForUpdate => " FOR UPDATE".to_string(),
            Lock::Custom(s) if s.trim().is_empty() => String::new(),
            Lock::Custom(s) => format!(" {}", s.trim()),
        }
    }

    pub(crate) fn parse_distinct(&self, distinct: bool) -> &'static str {
        if distinct { " DISTINCT" } else { "" }
    }

    /// 注释在第一个 `*/` 处截断。
    pub(crate) fn parse_comment(&self, comment: &str) -> String {
        let text = match comment.find("*/") {
            Some(pos) => &comment[..pos],
            None => comment,
        };
        let text = text.trim();
        if text.is_empty() {
            String::new()
        } else {
            format!(" /* {text} */")
        }
    }

    pub(crate) fn parse_force(&self, force: &[String]) -> String {
        if force.is_empty() {
            String::new()
        } else {
            format!(" FORCE INDEX ( {} )", force.join(","))
        }
    }

    pub(crate) fn parse_union(&self, ctx: &mut QueryContext, union: Option<&Union>) -> Result<String> {
        let Some(union) = union else {
            return Ok(String::new());
        };
        let kind = if union.all { "UNION ALL" } else { "UNION" };
        let mut out = String::new();
        for item in &union.items {
            let sql = match item {
                UnionItem::Subquery(sq) => self.compile_subquery(ctx, sq)?,
                UnionItem::Raw(sql) => sql.clone(),
            };
            out.push_str(&format!(" {kind} ( {sql} )"));
        }
        Ok(out)
    }
}

fn check_order_field(field: &str) -> Result<()> {
    if field.contains(')') || field.contains('#') {
        return Err(CompileError::InvalidClause {
            clause: "order",
            reason: format!("`{field}` is not a plain field"),
        });
    }
    Ok(())
}
