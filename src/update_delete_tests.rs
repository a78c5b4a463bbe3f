#[cfg(test)]
mod tests {
    use crate::{
        CompileError, Compiler, Condition, Criterion, DataValue, Flavor, Join, JoinKind,
        QueryOptions, SqlValue, raw,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn update_with_step_order_and_limit() {
        let c = Compiler::new(Flavor::MySQL);
        let mut opts = QueryOptions::new("t");
        opts.data("name", "x")
            .data("score", DataValue::inc(1))
            .where_(Condition::eq("id", 5))
            .order("id asc")
            .limit(1);
        let q = c.update(&opts).unwrap();
        assert_eq!(
            q.sql,
            "UPDATE `t` SET `name` = :data__name, `score` = `score` + 1 WHERE `id` = :where_AND_id ORDER BY `id` ASC LIMIT 1"
        );
        assert_eq!(q.binds.len(), 2);
        assert_eq!(q.binds.value("where_AND_id"), Some(&SqlValue::I64(5)));
    }

    #[test]
    fn update_where_and_data_share_a_bind_table() {
        let c = Compiler::new(Flavor::PostgreSQL);
        let mut opts = QueryOptions::new("t");
        opts.data("updated", raw("now()"))
            .data("a", 1)
            .where_(Condition::eq("a", 2));
        let q = c.update(&opts).unwrap();
        assert_eq!(
            q.sql,
            "UPDATE \"t\" SET \"updated\" = now(), \"a\" = :data__a WHERE \"a\" = :where_AND_a"
        );
        assert_eq!(q.binds.names().collect::<Vec<_>>(), vec!["data__a", "where_AND_a"]);
    }

    #[test]
    fn update_with_join() {
        let c = Compiler::new(Flavor::MySQL);
        let mut opts = QueryOptions::new("user u");
        opts.join(Join::new(JoinKind::Inner, "profile p", ["u.id=p.uid"]))
            .data("u.level", 3)
            .where_(Condition::eq("p.vip", 1));
        assert_eq!(
            c.update(&opts).unwrap().sql,
            "UPDATE `user` `u` SET `u`.`level` = :data__u_level INNER JOIN `profile` `p` ON `u`.`id` = `p`.`uid` WHERE `p`.`vip` = :where_AND_p_vip"
        );
    }

    #[test]
    fn update_without_data_fails() {
        let c = Compiler::new(Flavor::MySQL);
        let mut opts = QueryOptions::new("t");
        opts.where_(Condition::eq("id", 1));
        assert_eq!(c.update(&opts).unwrap_err(), CompileError::EmptyData);
    }

    #[test]
    fn delete_with_in_list() {
        let c = Compiler::new(Flavor::MySQL);
        let mut opts = QueryOptions::new("t");
        opts.where_(Condition::in_("id", vec![1, 2, 2, 3])).comment("purge");
        let q = c.delete(&opts).unwrap();
        assert_eq!(
            q.sql,
            "DELETE FROM `t` WHERE `id` IN (:where_AND_id_in_1,:where_AND_id_in_2,:where_AND_id_in_3) /* purge */"
        );
        assert_eq!(q.binds.value("where_AND_id_in_3"), Some(&SqlValue::I64(3)));
    }

    #[test]
    fn delete_using_on_postgres() {
        let c = Compiler::new(Flavor::PostgreSQL);
        let mut opts = QueryOptions::new("orders");
        opts.using("users")
            .where_(Condition::column("orders.uid", "=", "users.id"))
            .where_(Condition::eq("users.banned", true));
        assert_eq!(
            c.delete(&opts).unwrap().sql,
            "DELETE FROM \"orders\" USING \"users\" WHERE ( \"orders\".\"uid\" = \"users\".\"id\" ) AND \"users\".\"banned\" = :where_AND_users_banned"
        );
    }

    #[test]
    fn delete_respects_soft_delete() {
        let c = Compiler::new(Flavor::MySQL);
        let mut opts = QueryOptions::new("t");
        opts.where_(Condition::eq("id", 1))
            .soft_delete("deleted_at", Criterion::new("NULL", SqlValue::Null));
        assert_eq!(
            c.delete(&opts).unwrap().sql,
            "DELETE FROM `t` WHERE ( `id` = :where_AND_id ) AND `deleted_at` IS NULL"
        );
    }

    #[test]
    fn delete_needs_a_table() {
        let c = Compiler::new(Flavor::MySQL);
        assert!(matches!(
            c.delete(&QueryOptions::default()),
            Err(CompileError::InvalidClause { clause: "table", .. })
        ));
    }
}
