//! WHERE 条件编译：递归遍历逻辑分组，把每个条件分派给对应的运算符处理函数。

use std::borrow::Cow;

use crate::allocator::ParamAllocator;
use crate::compiler::{CompiledQuery, Compiler};
use crate::condition::{Condition, Criterion, Logic, LogicGroup, MultiItem, Subquery, WhereValue};
use crate::context::QueryContext;
use crate::error::{CompileError, Result};
use crate::operator::OperatorArgs;
use crate::options::QueryOptions;

/// 条件右侧：单个条件或同一字段上的多个条件。
#[derive(Debug, Clone, Copy)]
enum Rhs<'a> {
    Criterion(&'a Criterion),
    Multi(&'a [MultiItem]),
}

/// 这些运算符自己处理值，不做预绑定。
fn prebinds(op: &str) -> bool {
    !matches!(
        op,
        "EXP" | "NULL" | "NOT NULL" | "IN" | "NOT IN" | "BETWEEN" | "NOT BETWEEN"
    ) && !op.contains("TIME")
}

impl Compiler {
    /// 只编译条件树（不含 `WHERE` 关键字与软删除条件）。
    pub fn where_clause(&self, options: &QueryOptions) -> Result<CompiledQuery> {
        let mut ctx = QueryContext::new(options.clone());
        let sql = self.build_where(&mut ctx, &options.where_)?;
        Ok(self.finish("where", sql, ctx))
    }

    /// 按顺序拼接逻辑分组，首个非空分组不带逻辑词。
    pub fn build_where(&self, ctx: &mut QueryContext, groups: &[LogicGroup]) -> Result<String> {
        let mut out = String::new();
        for group in groups {
            let mut parts = Vec::with_capacity(group.conditions.len());
            for condition in &group.conditions {
                if let Some(sql) = self.compile_condition(ctx, condition, group.logic)? {
                    parts.push(sql);
                }
            }
            if parts.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
                out.push_str(group.logic.as_str());
                out.push(' ');
            }
            out.push_str(&parts.join(&format!(" {} ", group.logic)));
        }
        Ok(out)
    }

    /// 完整的 WHERE 子句（带前导空格），软删除条件追加在用户条件之后。
    pub(crate) fn parse_where(&self, ctx: &mut QueryContext) -> Result<String> {
        let options = ctx.shared_options();
        let mut sql = self.build_where(ctx, &options.where_)?;
        if let Some(soft) = &options.soft_delete {
            let item =
                self.parse_where_item(ctx, &soft.field, Rhs::Criterion(&soft.criterion), None, None)?;
            sql = if sql.is_empty() {
                item
            } else {
                format!("( {sql} ) AND {item}")
            };
        }
        if sql.is_empty() {
            Ok(sql)
        } else {
            Ok(format!(" WHERE {sql}"))
        }
    }

    fn compile_condition(
        &self,
        ctx: &mut QueryContext,
        condition: &Condition,
        logic: Logic,
    ) -> Result<Option<String>> {
        match condition {
            Condition::Raw(e) => Ok(Some(format!("( {e} )"))),
            Condition::Subquery(sq) => self.compile_nested_where(ctx, sq),
            Condition::All(items) => {
                if items.is_empty() {
                    return Ok(None);
                }
                let mut parts = Vec::with_capacity(items.len());
                for (field, criterion) in items {
                    parts.push(self.parse_where_item(
                        ctx,
                        field,
                        Rhs::Criterion(criterion),
                        Some(logic),
                        None,
                    )?);
                }
                Ok(Some(format!("( {} )", parts.join(" AND "))))
            }
            Condition::Simple { field, criterion } => self
                .compile_field(ctx, field, Rhs::Criterion(criterion), logic)
                .map(Some),
            Condition::Multi { field, items } => self
                .compile_field(ctx, field, Rhs::Multi(items), logic)
                .map(Some),
        }
    }

    /// `a|b` 以 OR、`a&b` 以 AND 展开为多个同条件的字段。
    fn compile_field(
        &self,
        ctx: &mut QueryContext,
        field: &str,
        rhs: Rhs<'_>,
        logic: Logic,
    ) -> Result<String> {
        let split = if field.contains('|') {
            Some(('|', Logic::Or))
        } else if field.contains('&') {
            Some(('&', Logic::And))
        } else {
            None
        };
        let Some((sep, joiner)) = split else {
            return self.parse_where_item(ctx, field, rhs, Some(logic), None);
        };
        let mut parts = Vec::new();
        for sub in field.split(sep).map(str::trim).filter(|f| !f.is_empty()) {
            parts.push(self.parse_where_item(ctx, sub, rhs, None, None)?);
        }
        if parts.is_empty() {
            return Err(CompileError::malformed(format!("`{field}` names no field")));
        }
        Ok(format!("( {} )", parts.join(&format!(" {joiner} "))))
    }

    fn compile_nested_where(&self, ctx: &mut QueryContext, sq: &Subquery) -> Result<Option<String>> {
        let mut child = ctx.new_nested_context();
        sq.apply(child.options_mut());
        let options = child.shared_options();
        let mut sql = self
            .build_where(&mut child, &options.where_)
            .map_err(CompileError::subquery)?;
        if sql.is_empty() {
            return Ok(None);
        }
        ctx.merge_nested(child, &mut sql);
        Ok(Some(format!("( {sql} )")))
    }

    fn parse_where_item(
        &self,
        ctx: &mut QueryContext,
        field: &str,
        rhs: Rhs<'_>,
        rule: Option<Logic>,
        bind_name: Option<String>,
    ) -> Result<String> {
        let criterion = match rhs {
            Rhs::Criterion(c) => c,
            Rhs::Multi(items) => return self.parse_multi(ctx, field, items, rule),
        };

        let op = self.operators().normalize(&criterion.op);
        let handler = self
            .operators()
            .resolve(&op)
            .ok_or_else(|| CompileError::UnknownOperator(op.clone()))?;

        let key = if field.is_empty() {
            String::new()
        } else {
            self.quote(field)
        };
        let bind_name = bind_name.unwrap_or_else(|| {
            format!(
                "where_{}_{}",
                rule.map(Logic::as_str).unwrap_or_default(),
                field.replace(['.', '-'], "_")
            )
        });
        let bind_name = ParamAllocator::normalize(&bind_name);
        let bind_type = self.bind_type(ctx, field);

        let value = match &criterion.value {
            WhereValue::Valuer(v) => Cow::Owned(WhereValue::Value(v.value()?)),
            other => Cow::Borrowed(other),
        };
        let prebound = match value.as_ref() {
            WhereValue::Value(v) if prebinds(&op) => Some(ctx.bind(&bind_name, v.clone(), bind_type)),
            WhereValue::Param(name) if !ctx.is_bound(name) => {
                return Err(CompileError::malformed(format!(
                    "parameter `{name}` is not bound"
                )));
            }
            _ => None,
        };
        let value = match prebound {
            Some(name) => Cow::Owned(WhereValue::Param(name)),
            None => value,
        };

        let args = OperatorArgs {
            key: &key,
            op: &op,
            value: &value,
            field,
            bind_name: &bind_name,
            bind_type,
            logic: criterion.logic.unwrap_or_default(),
        };
        handler(self, ctx, &args)
    }

    /// 同一字段上的多个条件；末尾的逻辑词决定连接方式。
    fn parse_multi(
        &self,
        ctx: &mut QueryContext,
        field: &str,
        items: &[MultiItem],
        rule: Option<Logic>,
    ) -> Result<String> {
        let (items, combinator) = match items.split_last() {
            Some((MultiItem::Keyword(k), rest)) => match Logic::parse(k) {
                Some(logic) => (rest, logic),
                None => {
                    return Err(CompileError::malformed(format!(
                        "`{k}` is not a logic keyword"
                    )));
                }
            },
            _ => (items, rule.unwrap_or_default()),
        };
        if items.is_empty() {
            return Err(CompileError::malformed(format!("`{field}` has no conditions")));
        }
        let base = field.replace('.', "_");
        let mut parts = Vec::with_capacity(items.len());
        for (k, item) in items.iter().enumerate() {
            let MultiItem::Criterion(criterion) = item else {
                return Err(CompileError::malformed(format!(
                    "`{field}` has a logic keyword before its last condition"
                )));
            };
            parts.push(self.parse_where_item(
                ctx,
                field,
                Rhs::Criterion(criterion),
                Some(combinator),
                Some(format!("where_{base}_{k}")),
            )?);
        }
        Ok(format!("( {} )", parts.join(&format!(" {combinator} "))))
    }
}
