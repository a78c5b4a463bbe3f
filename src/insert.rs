//! INSERT / REPLACE、批量插入与 INSERT ... SELECT 的语句组装。

use std::collections::HashMap;

use crate::compiler::{CompiledQuery, Compiler};
use crate::context::QueryContext;
use crate::data::DataValue;
use crate::error::{CompileError, Result};
use crate::options::QueryOptions;
use crate::string_builder::fill_template;

const INSERT_SQL: &str = "%INSERT% INTO %TABLE% (%FIELD%) VALUES (%DATA%)%COMMENT%";
const INSERT_ALL_SQL: &str = "%INSERT% INTO %TABLE% (%FIELD%) %DATA%%COMMENT%";
const SELECT_INSERT_SQL: &str = "INSERT INTO %TABLE% (%FIELD%) %SELECT%";

fn insert_keyword(replace: bool) -> &'static str {
    if replace { "REPLACE" } else { "INSERT" }
}

/// 按首行的字段顺序排列一行的值；字段集合不一致时返回 `None`。
fn align_row(columns: &[String], row: Vec<(String, String)>) -> Option<Vec<String>> {
    if row.len() != columns.len() {
        return None;
    }
    let mut by_column: HashMap<String, String> = row.into_iter().collect();
    if by_column.len() != columns.len() {
        return None;
    }
    columns.iter().map(|c| by_column.remove(c)).collect()
}

impl Compiler {
    /// 写入目标表（不带别名）。
    fn insert_table(&self, options: &QueryOptions) -> Result<String> {
        options
            .table
            .primary()
            .map(|t| self.quote(t))
            .ok_or_else(|| CompileError::InvalidClause {
                clause: "table",
                reason: "no table to insert into".into(),
            })
    }

    /// 单行插入，`replace` 为 true 时使用 `REPLACE`。
    pub fn insert(&self, options: &QueryOptions, replace: bool) -> Result<CompiledQuery> {
        let mut ctx = QueryContext::new(options.clone());
        let sql = self.insert_with(&mut ctx, replace)?;
        Ok(self.finish("insert", sql, ctx))
    }

    pub fn insert_with(&self, ctx: &mut QueryContext, replace: bool) -> Result<String> {
        let options = ctx.shared_options();
        let table = self.insert_table(&options)?;
        let fields = self.reference_fields(&options);
        let data = self.compile_assignments(ctx, &options.data, &fields, "")?;
        if data.is_empty() {
            return Err(CompileError::EmptyData);
        }
        let (columns, values): (Vec<String>, Vec<String>) = data.into_iter().unzip();
        let comment = self.parse_comment(&options.comment);

        Ok(fill_template(
            INSERT_SQL,
            &[
                ("INSERT", insert_keyword(replace)),
                ("TABLE", table.as_str()),
                ("FIELD", columns.join(", ").as_str()),
                ("DATA", values.join(", ").as_str()),
                ("COMMENT", comment.as_str()),
            ],
        ))
    }

    /// 批量插入。每行的参数名带 `_<行号>` 后缀；各行的字段集合必须与第一行一致，
    /// 值按第一行的字段顺序输出。
    pub fn insert_all(
        &self,
        options: &QueryOptions,
        rows: &[Vec<(String, DataValue)>],
        replace: bool,
    ) -> Result<CompiledQuery> {
        let mut ctx = QueryContext::new(options.clone());
        let sql = self.insert_all_with(&mut ctx, rows, replace)?;
        Ok(self.finish("insert_all", sql, ctx))
    }

    pub fn insert_all_with(
        &self,
        ctx: &mut QueryContext,
        rows: &[Vec<(String, DataValue)>],
        replace: bool,
    ) -> Result<String> {
        let options = ctx.shared_options();
        let table = self.insert_table(&options)?;
        let fields = self.reference_fields(&options);

        let mut columns: Option<Vec<String>> = None;
        let mut values = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let data = self.compile_assignments(ctx, row, &fields, &format!("_{i}"))?;
            let vals = match &columns {
                None => {
                    let (cols, vals): (Vec<String>, Vec<String>) = data.into_iter().unzip();
                    columns = Some(cols);
                    vals
                }
                Some(first) => align_row(first, data).ok_or_else(|| CompileError::InvalidData {
                    field: format!("row {i}"),
                    reason: "columns differ from the first row".into(),
                })?,
            };
            values.push(vals.join(", "));
        }
        let columns = columns.unwrap_or_default();
        if columns.is_empty() {
            return Err(CompileError::EmptyData);
        }

        let data = if self.flavor().supports_multi_values() {
            let rows: Vec<String> = values.iter().map(|v| format!("({v})")).collect();
            format!("VALUES {}", rows.join(", "))
        } else {
            let rows: Vec<String> = values.iter().map(|v| format!("SELECT {v}")).collect();
            rows.join(" UNION ALL ")
        };
        let comment = self.parse_comment(&options.comment);

        Ok(fill_template(
            INSERT_ALL_SQL,
            &[
                ("INSERT", insert_keyword(replace)),
                ("TABLE", table.as_str()),
                ("FIELD", columns.join(", ").as_str()),
                ("DATA", data.as_str()),
                ("COMMENT", comment.as_str()),
            ],
        ))
    }

    /// `INSERT INTO table (fields) SELECT ...`，SELECT 部分由 `options` 编译。
    pub fn select_insert(
        &self,
        options: &QueryOptions,
        fields: &[&str],
        table: &str,
    ) -> Result<CompiledQuery> {
        let mut ctx = QueryContext::new(options.clone());
        let select = self.select_with(&mut ctx)?;
        let fields: Vec<String> = fields.iter().map(|f| self.quote(f)).collect();
        let sql = fill_template(
            SELECT_INSERT_SQL,
            &[
                ("TABLE", self.quote(table).as_str()),
                ("FIELD", fields.join(", ").as_str()),
                ("SELECT", select.as_str()),
            ],
        );
        Ok(self.finish("select_insert", sql, ctx))
    }
}
