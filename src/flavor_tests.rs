#[cfg(test)]
mod tests {
    use crate::flavor::{Flavor, default_flavor, set_default_flavor_scoped};
    use pretty_assertions::assert_eq;

    #[test]
    fn flavor_display() {
        let cases = vec![
            (Flavor::MySQL, "MySQL"),
            (Flavor::PostgreSQL, "PostgreSQL"),
            (Flavor::SQLite, "SQLite"),
        ];

        for (f, expected) in cases {
            assert_eq!(f.to_string(), expected);
        }
    }

    #[test]
    fn quote_per_flavor() {
        assert_eq!(Flavor::MySQL.quote("id"), "`id`");
        assert_eq!(Flavor::PostgreSQL.quote("id"), "\"id\"");
        assert_eq!(Flavor::SQLite.quote("id"), "\"id\"");
    }

    #[test]
    fn limit_per_flavor() {
        assert_eq!(Flavor::MySQL.limit(None, 10), " LIMIT 10");
        assert_eq!(Flavor::MySQL.limit(Some(20), 10), " LIMIT 20,10");
        assert_eq!(Flavor::SQLite.limit(Some(20), 10), " LIMIT 20,10");
        assert_eq!(Flavor::PostgreSQL.limit(Some(20), 10), " LIMIT 10 OFFSET 20");
    }

    #[test]
    fn json_paths_per_flavor() {
        assert_eq!(
            Flavor::MySQL.json_extract("`info`", "a.b"),
            "json_extract(`info`, '$.a.b')"
        );
        assert_eq!(
            Flavor::PostgreSQL.json_extract("\"info\"", "a.b"),
            "(\"info\" #>> '{a,b}')"
        );
        let sets = vec![
            ("a".to_string(), ":x".to_string()),
            ("b.c".to_string(), ":y".to_string()),
        ];
        assert_eq!(
            Flavor::MySQL.json_set("`info`", &sets),
            "json_set(`info`, '$.a', :x, '$.b.c', :y)"
        );
        assert_eq!(
            Flavor::PostgreSQL.json_set("\"info\"", &sets),
            "jsonb_set(jsonb_set(\"info\", '{a}', to_jsonb(:x)), '{b,c}', to_jsonb(:y))"
        );
    }

    #[test]
    fn scoped_default_flavor_restores() {
        let before = default_flavor();
        {
            let _guard = set_default_flavor_scoped(Flavor::SQLite);
            assert_eq!(default_flavor(), Flavor::SQLite);
        }
        assert_eq!(default_flavor(), before);
    }
}
