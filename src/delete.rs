//! DELETE 语句组装。

use crate::compiler::{CompiledQuery, Compiler};
use crate::context::QueryContext;
use crate::error::{CompileError, Result};
use crate::options::QueryOptions;
use crate::string_builder::fill_template;

const DELETE_SQL: &str = "DELETE FROM %TABLE%%USING%%JOIN%%WHERE%%ORDER%%LIMIT%%LOCK%%COMMENT%";

impl Compiler {
    pub fn delete(&self, options: &QueryOptions) -> Result<CompiledQuery> {
        let mut ctx = QueryContext::new(options.clone());
        let sql = self.delete_with(&mut ctx)?;
        Ok(self.finish("delete", sql, ctx))
    }

    pub fn delete_with(&self, ctx: &mut QueryContext) -> Result<String> {
        let options = ctx.shared_options();
        if options.table.is_empty() {
            return Err(CompileError::InvalidClause {
                clause: "table",
                reason: "no table to delete from".into(),
            });
        }
        let table = self.parse_table(ctx, &options.table);
        let using = match &options.using {
            Some(using) if !using.is_empty() => format!(" USING {}", self.parse_table(ctx, using)),
            _ => String::new(),
        };
        let join = self.parse_join(ctx, &options.join);
        let where_sql = self.parse_where(ctx)?;
        let order = self.parse_order(ctx, &options.order)?;
        let limit = self.parse_limit(options.limit.as_ref());
        let lock = self.parse_lock(&options.lock);
        let comment = self.parse_comment(&options.comment);

        Ok(fill_template(
            DELETE_SQL,
            &[
                ("TABLE", table.as_str()),
                ("USING", using.as_str()),
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
