//! UPDATE 语句组装。

use crate::compiler::{CompiledQuery, Compiler};
use crate::context::QueryContext;
use crate::error::{CompileError, Result};
use crate::options::QueryOptions;
use crate::string_builder::{StringBuilder, fill_template};

const UPDATE_SQL: &str = "UPDATE %TABLE% SET %SET%%JOIN%%WHERE%%ORDER%%LIMIT%%LOCK%%COMMENT%";

impl Compiler {
    pub fn update(&self, options: &QueryOptions) -> Result<CompiledQuery> {
        let mut ctx = QueryContext::new(options.clone());
        let sql = self.update_with(&mut ctx)?;
        Ok(self.finish("update", sql, ctx))
    }

    pub fn update_with(&self, ctx: &mut QueryContext) -> Result<String> {
        let options = ctx.shared_options();
        if options.table.is_empty() {
            return Err(CompileError::InvalidClause {
                clause: "table",
                reason: "no table to update".into(),
            });
        }
        let table = self.parse_table(ctx, &options.table);
        let fields = self.reference_fields(&options);
        let data = self.compile_assignments(ctx, &options.data, &fields, "")?;
        if data.is_empty() {
            return Err(CompileError::EmptyData);
        }
        let assignments: Vec<String> = data
            .into_iter()
            .map(|(col, val)| format!("{col} = {val}"))
            .collect();
        let mut set = StringBuilder::default();
        set.write_strings(&assignments, ", ");
        let set = set.into_string();

        let join = self.parse_join(ctx, &options.join);
        let where_sql = self.parse_where(ctx)?;
        let order = self.parse_order(ctx, &options.order)?;
        let limit = self.parse_limit(options.limit.as_ref());
        let lock = self.parse_lock(&options.lock);
        let comment = self.parse_comment(&options.comment);

        Ok(fill_template(
            UPDATE_SQL,
            &[
                ("TABLE", table.as_str()),
                ("SET", set.as_str()),
                ("JOIN", join.as_str()),
                ("WHERE", where_sql.as_str()),
                ("ORDER", order.as_str()),
                ("LIMIT", limit.as_str()),
                ("LOCK", lock.as_str()),
                ("COMMENT", comment.as_str()),
            ],
        ))
    }
}
