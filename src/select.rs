//! SELECT 语句组装，以及子查询在嵌套上下文中的编译。

use crate::compiler::{CompiledQuery, Compiler};
use crate::condition::Subquery;
use crate::context::QueryContext;
use crate::error::{CompileError, Result};
use crate::options::QueryOptions;
use crate::string_builder::fill_template;

const SELECT_SQL: &str = "SELECT%DISTINCT% %FIELD% FROM %TABLE%%FORCE%%JOIN%%WHERE%%GROUP%%HAVING%%UNION%%ORDER%%LIMIT%%LOCK%%COMMENT%";

impl Compiler {
    pub fn select(&self, options: &QueryOptions) -> Result<CompiledQuery> {
        let mut ctx = QueryContext::new(options.clone());
        let sql = self.select_with(&mut ctx)?;
        Ok(self.finish("select", sql, ctx))
    }

    /// 在调用方提供的上下文中编译，绑定写入该上下文。
    pub fn select_with(&self, ctx: &mut QueryContext) -> Result<String> {
        let options = ctx.shared_options();
        if options.table.is_empty() {
            return Err(CompileError::InvalidClause {
                clause: "table",
                reason: "no table to select from".into(),
            });
        }
        let table = self.parse_table(ctx, &options.table);
        let distinct = self.parse_distinct(options.distinct);
        let field = self.parse_field(&options.field);
        let join = self.parse_join(ctx, &options.join);
        let where_sql = self.parse_where(ctx)?;
        let group = self.parse_group(&options.group);
        let having = self.parse_having(&options.having);
        let order = self.parse_order(ctx, &options.order)?;
        let limit = self.parse_limit(options.limit.as_ref());
        let union = self.parse_union(ctx, options.union.as_ref())?;
        let lock = self.parse_lock(&options.lock);
        let comment = self.parse_comment(&options.comment);
        let force = self.parse_force(&options.force);

        Ok(fill_template(
            SELECT_SQL,
            &[
                ("DISTINCT", distinct),
                ("FIELD", field.as_str()),
                ("TABLE", table.as_str()),
                ("FORCE", force.as_str()),
                ("JOIN", join.as_str()),
                ("WHERE", where_sql.as_str()),
                ("GROUP", group.as_str()),
                ("HAVING", having.as_str()),
                ("UNION", union.as_str()),
                ("ORDER", order.as_str()),
                ("LIMIT", limit.as_str()),
                ("LOCK", lock.as_str()),
                ("COMMENT", comment.as_str()),
            ],
        ))
    }

    /// 在嵌套上下文中编译子查询的完整 SELECT，并把绑定合并回 `ctx`。
    pub(crate) fn compile_subquery(&self, ctx: &mut QueryContext, sq: &Subquery) -> Result<String> {
        let mut child = ctx.new_nested_context();
        sq.apply(child.options_mut());
        let mut sql = self.select_with(&mut child).map_err(CompileError::subquery)?;
        ctx.merge_nested(child, &mut sql);
        Ok(sql)
    }
}
