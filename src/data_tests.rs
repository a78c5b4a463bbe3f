#[cfg(test)]
mod tests {
    use crate::{
        BindTable, BindType, CompileError, Compiler, DataValue, Flavor, PlainResolver,
        QueryContext, QueryOptions, SqlValue, SqlValuer, StaticSchema, ValuerError, raw,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn compiler() -> Compiler {
        Compiler::builder()
            .flavor(Flavor::MySQL)
            .resolver(PlainResolver)
            .build()
    }

    fn assignments(
        c: &Compiler,
        opts: &QueryOptions,
    ) -> (Result<Vec<(String, String)>, CompileError>, BindTable) {
        let mut ctx = QueryContext::new(opts.clone());
        let fields = c.reference_fields(opts);
        let out = c.compile_assignments(&mut ctx, &opts.data, &fields, "");
        (out, ctx.into_binds())
    }

    fn pair(col: &str, val: &str) -> (String, String) {
        (col.to_string(), val.to_string())
    }

    #[test]
    fn strict_mode_rejects_unknown_fields() {
        let mut opts = QueryOptions::new("t");
        opts.field(["a", "b"]).strict(true).data("c", 5);
        let (out, _) = assignments(&compiler(), &opts);
        assert_eq!(out, Err(CompileError::UnknownField("c".into())));
    }

    #[test]
    fn lenient_mode_skips_unknown_fields() {
        let mut opts = QueryOptions::new("t");
        opts.field(["a", "b"]).data("c", 5);
        let (out, binds) = assignments(&compiler(), &opts);
        assert_eq!(out, Ok(vec![]));
        assert!(binds.is_empty());
        assert_eq!(compiler().update(&opts).unwrap_err(), CompileError::EmptyData);
    }

    #[test]
    fn schema_fields_are_the_reference_set() {
        let c = Compiler::builder()
            .flavor(Flavor::MySQL)
            .resolver(PlainResolver)
            .schema(StaticSchema::new().table("t", [("a", "int(11)"), ("b", "varchar(8)")]))
            .build();
        let mut opts = QueryOptions::new("t");
        opts.strict(true).data("a", 1).data("zz", 2);
        let (out, _) = assignments(&c, &opts);
        assert_eq!(out, Err(CompileError::UnknownField("zz".into())));

        let mut opts = QueryOptions::new("t");
        opts.data("a", 1);
        let (out, binds) = assignments(&c, &opts);
        assert_eq!(out, Ok(vec![pair("a", ":data__a")]));
        assert_eq!(binds.get("data__a").map(|e| e.ty), Some(BindType::Int));
    }

    #[test]
    fn no_reference_set_disables_the_check() {
        let mut opts = QueryOptions::new("t");
        opts.strict(true).data("anything", 1);
        let (out, _) = assignments(&compiler(), &opts);
        assert_eq!(out, Ok(vec![pair("anything", ":data__anything")]));
    }

    #[test]
    fn increments_are_not_bound() {
        let mut opts = QueryOptions::new("t");
        opts.data("a", DataValue::inc(3))
            .data("b", DataValue::dec(1.5))
            .data("c", json!(["inc", "2"]));
        let (out, binds) = assignments(&compiler(), &opts);
        assert_eq!(
            out,
            Ok(vec![pair("a", "a + 3"), pair("b", "b - 1.5"), pair("c", "c + 2")])
        );
        assert!(binds.is_empty());
    }

    #[test]
    fn null_and_raw_are_inlined() {
        let mut opts = QueryOptions::new("t");
        opts.field(["a"])
            .strict(true)
            .data("a", SqlValue::Null)
            .data("b", raw("b * 2"));
        let (out, binds) = assignments(&compiler(), &opts);
        assert_eq!(out, Ok(vec![pair("a", "NULL"), pair("b", "b * 2")]));
        assert!(binds.is_empty());
    }

    #[test]
    fn structured_values_on_json_fields_are_serialized() {
        let c = Compiler::builder()
            .flavor(Flavor::MySQL)
            .resolver(PlainResolver)
            .schema(StaticSchema::new().table("t", [("meta", "json"), ("n", "int")]))
            .build();
        let mut opts = QueryOptions::new("t");
        opts.json(["tags"])
            .data("meta", json!({"k": 1}))
            .data("tags", json!(["a", "b"]));
        let (out, binds) = assignments(&c, &opts);
        assert_eq!(
            out,
            Ok(vec![pair("meta", ":data__meta"), pair("tags", ":data__tags")])
        );
        assert_eq!(binds.value("data__meta"), Some(&SqlValue::from(r#"{"k":1}"#)));
        assert_eq!(binds.value("data__tags"), Some(&SqlValue::from(r#"["a","b"]"#)));
    }

    #[test]
    fn structured_values_elsewhere_are_invalid() {
        let mut opts = QueryOptions::new("t");
        opts.data("a", json!({"k": 1}));
        let (out, _) = assignments(&compiler(), &opts);
        assert!(matches!(out, Err(CompileError::InvalidData { field, .. }) if field == "a"));
    }

    #[test]
    fn jsonb_columns_accept_structured_values() {
        let c = Compiler::builder()
            .flavor(Flavor::PostgreSQL)
            .schema(StaticSchema::new().table("doc", [("id", "int"), ("meta", "JSONB")]))
            .build();
        let mut opts = QueryOptions::new("doc");
        opts.data("meta", json!({"a": 1}));
        let q = c.insert(&opts, false).unwrap();
        assert_eq!(q.sql, "INSERT INTO \"doc\" (\"meta\") VALUES (:data__meta)");
        assert_eq!(q.binds.value("data__meta"), Some(&SqlValue::from(r#"{"a":1}"#)));

        let mut opts = QueryOptions::new("doc d");
        opts.data("d.meta", json!([1, 2]));
        let q = c.update(&opts).unwrap();
        assert_eq!(q.sql, "UPDATE \"doc\" \"d\" SET \"d\".\"meta\" = :data__d_meta");
        assert_eq!(q.binds.value("data__d_meta"), Some(&SqlValue::from("[1,2]")));
    }

    #[test]
    fn json_paths_merge_per_column() {
        let mut opts = QueryOptions::new("t");
        opts.field(["name"])
            .strict(true)
            .data("info->a", 1)
            .data("name", "x")
            .data("info->b.c", "y");
        let (out, binds) = assignments(&compiler(), &opts);
        assert_eq!(
            out,
            Ok(vec![
                pair("info", "json_set(info, '$.a', :data__info, '$.b.c', :data__info_1)"),
                pair("name", ":data__name"),
            ])
        );
        assert_eq!(binds.value("data__info_1"), Some(&SqlValue::from("y")));
    }

    #[test]
    fn qualified_keys_skip_the_check() {
        let mut opts = QueryOptions::new("t");
        opts.field(["a"]).strict(true).data("t.b", 2);
        let (out, _) = assignments(&compiler(), &opts);
        assert_eq!(out, Ok(vec![pair("t.b", ":data__t_b")]));
    }

    #[derive(Debug, Clone)]
    struct Upper(&'static str);

    impl SqlValuer for Upper {
        fn value(&self) -> Result<SqlValue, ValuerError> {
            Ok(SqlValue::from(self.0.to_uppercase()))
        }
    }

    #[derive(Debug, Clone)]
    struct Broken;

    impl SqlValuer for Broken {
        fn value(&self) -> Result<SqlValue, ValuerError> {
            Err(ValuerError("broken".into()))
        }
    }

    #[test]
    fn valuers_resolve_at_compile_time() {
        let mut opts = QueryOptions::new("t");
        opts.data("code", DataValue::valuer(Upper("abc")));
        let (out, binds) = assignments(&compiler(), &opts);
        assert_eq!(out, Ok(vec![pair("code", ":data__code")]));
        assert_eq!(binds.value("data__code"), Some(&SqlValue::from("ABC")));

        let mut opts = QueryOptions::new("t");
        opts.data("code", DataValue::valuer(Broken));
        let (out, _) = assignments(&compiler(), &opts);
        assert_eq!(out, Err(CompileError::Valuer(ValuerError("broken".into()))));
    }

    #[test]
    fn params_must_already_be_bound() {
        let c = compiler();
        let mut opts = QueryOptions::new("t");
        opts.data("a", DataValue::param("shared"));
        let mut binds = BindTable::new();
        binds.try_insert("shared", 9, BindType::Int);
        let mut ctx = QueryContext::new(opts.clone()).with_binds(binds);
        let out = c.compile_assignments(&mut ctx, &opts.data, &[], "");
        assert_eq!(out, Ok(vec![pair("a", ":shared")]));

        let (out, _) = assignments(&c, &opts);
        assert!(matches!(out, Err(CompileError::InvalidData { .. })));
    }
}
