#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use crate::{
        CompileError, Compiler, Condition, Flavor, OperatorArgs, PlainResolver, QueryContext,
        QueryOptions, Result, SqlValue, render_operand, set_default_flavor_scoped,
    };
    use pretty_assertions::assert_eq;

    fn regexp(c: &Compiler, ctx: &mut QueryContext, a: &OperatorArgs<'_>) -> Result<String> {
        let operand = render_operand(c, ctx, a, a.value)?;
        Ok(format!("{} {} {}", a.key, a.op, operand))
    }

    fn compiler() -> Compiler {
        Compiler::builder()
            .flavor(Flavor::MySQL)
            .resolver(PlainResolver)
            .bind_parser("regexp", &["REGEXP", "NOT REGEXP"], regexp)
            .unwrap()
            .alias("rlike", "regexp")
            .unwrap()
            .build()
    }

    #[test]
    fn custom_operator_is_dispatched() {
        let c = compiler();
        let mut opts = QueryOptions::new("t");
        opts.where_(Condition::new("name", "regexp", "^a"))
            .where_(Condition::new("code", "not regexp", "x$"));
        let q = c.where_clause(&opts).unwrap();
        assert_eq!(
            q.sql,
            "name REGEXP :where_AND_name AND code NOT REGEXP :where_AND_code"
        );
        assert_eq!(q.binds.value("where_AND_name"), Some(&SqlValue::from("^a")));
        assert_eq!(c.operators().family("NOT REGEXP"), Some("regexp"));
    }

    #[test]
    fn custom_alias_resolves_to_registered_token() {
        let c = compiler();
        let mut opts = QueryOptions::new("t");
        opts.where_(Condition::new("name", "RLike", "^b"));
        assert_eq!(c.where_clause(&opts).unwrap().sql, "name REGEXP :where_AND_name");
    }

    #[test]
    fn builtin_tokens_cannot_be_replaced() {
        let err = Compiler::builder().bind_parser("mine", &["regexp", "="], regexp).err();
        assert_eq!(err, Some(CompileError::ReservedOperator("=".into())));

        let err = Compiler::builder().alias("in", "regexp").err();
        assert_eq!(err, Some(CompileError::ReservedOperator("IN".into())));

        let err = Compiler::builder().alias("rlike", "regexp").err();
        assert_eq!(err, Some(CompileError::UnknownOperator("REGEXP".into())));
    }

    #[test]
    fn compiler_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Compiler>();

        let c = Arc::new(compiler());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let c = Arc::clone(&c);
                thread::spawn(move || {
                    let mut opts = QueryOptions::new("t");
                    opts.where_(Condition::eq("id", i));
                    c.select(&opts).unwrap()
                })
            })
            .collect();
        for (i, h) in handles.into_iter().enumerate() {
            let q = h.join().unwrap();
            assert_eq!(q.sql, "SELECT * FROM t WHERE id = :where_AND_id");
            assert_eq!(q.binds.value("where_AND_id"), Some(&SqlValue::I64(i as i64)));
        }
    }

    #[test]
    fn builder_falls_back_to_default_flavor() {
        let _g = set_default_flavor_scoped(Flavor::PostgreSQL);
        let c = Compiler::default();
        assert_eq!(c.flavor(), Flavor::PostgreSQL);
        let mut opts = QueryOptions::new("t");
        opts.limit_offset(5, 10);
        assert_eq!(c.select(&opts).unwrap().sql, "SELECT * FROM \"t\" LIMIT 10 OFFSET 5");
    }
}
