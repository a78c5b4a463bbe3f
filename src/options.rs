//! 查询选项：编译器的输入。
//!
//! 由上层流式 API 构造，一次编译期间只读。这里提供的链式方法只做字段赋值，
//! 所有校验都在编译阶段完成。

use std::collections::HashMap;

use crate::bind::BindType;
use crate::condition::{Condition, Criterion, Logic, LogicGroup, Subquery};
use crate::data::DataValue;
use crate::expr::Expr;
use crate::value::SqlValue;

/// 一张表及可选别名。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    /// 解析 `user`、`user u`、`user AS u` 三种写法。
    pub fn parse(s: &str) -> Self {
        let parts: Vec<&str> = s.split_whitespace().collect();
        match parts.as_slice() {
            [name, kw, alias] if kw.eq_ignore_ascii_case("as") => Self::aliased(*name, *alias),
            [name, alias] => Self::aliased(*name, *alias),
            _ => Self::new(s.trim()),
        }
    }
}

/// 表规格：一张或多张表。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSpec(pub Vec<TableRef>);

impl TableSpec {
    /// 逗号分隔的多张表，每项按 [`TableRef::parse`] 解析。
    pub fn parse(s: &str) -> Self {
        Self(
            s.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(TableRef::parse)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 主表名。
    pub fn primary(&self) -> Option<&str> {
        self.0.first().map(|t| t.name.as_str())
    }

    /// 通过内联别名查找表名。
    pub fn table_for_alias(&self, alias: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|t| t.alias.as_deref() == Some(alias))
            .map(|t| t.name.as_str())
    }
}

impl From<&str> for TableSpec {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<TableRef> for TableSpec {
    fn from(t: TableRef) -> Self {
        Self(vec![t])
    }
}

/// 查询字段中的一项。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldItem {
    Name(String),
    Alias { name: String, alias: String },
    Raw(Expr),
}

impl From<&str> for FieldItem {
    fn from(s: &str) -> Self {
        Self::Name(s.to_string())
    }
}

impl From<String> for FieldItem {
    fn from(s: String) -> Self {
        Self::Name(s)
    }
}

impl From<Expr> for FieldItem {
    fn from(e: Expr) -> Self {
        Self::Raw(e)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldSpec {
    #[default]
    All,
    List(Vec<FieldItem>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Full => "FULL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: TableSpec,
    pub on: Vec<String>,
}

impl Join {
    pub fn new<I, S>(kind: JoinKind, table: impl Into<TableSpec>, on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            table: table.into(),
            on: on.into_iter().map(Into::into).collect(),
        }
    }
}

/// 排序项。方向保持原始文本，编译时只接受 `ASC` / `DESC`。
#[derive(Debug, Clone, PartialEq)]
pub enum OrderItem {
    Field { field: String, sort: Option<String> },
    Raw(Expr),
    /// `field(col, v1, v2, ...)` 按给定值顺序排序。
    Values {
        field: String,
        values: Vec<SqlValue>,
        sort: Option<String>,
    },
    Rand,
}

impl OrderItem {
    /// 解析 `id`、`id desc`、`[rand]`。
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s == "[rand]" {
            return Self::Rand;
        }
        match s.rsplit_once(char::is_whitespace) {
            Some((field, sort)) => Self::Field {
                field: field.trim().to_string(),
                sort: Some(sort.to_string()),
            },
            None => Self::Field {
                field: s.to_string(),
                sort: None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub offset: Option<u64>,
    pub length: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Lock {
    #[default]
    None,
    ForUpdate,
    Custom(String),
}

#[derive(Debug, Clone)]
pub enum UnionItem {
    Subquery(Subquery),
    Raw(String),
}

#[derive(Debug, Clone, Default)]
pub struct Union {
    pub all: bool,
    pub items: Vec<UnionItem>,
}

/// 软删除过滤条件，编译时强制追加在用户条件之后。
#[derive(Debug, Clone)]
pub struct SoftDelete {
    pub field: String,
    pub criterion: Criterion,
}

/// 一次编译的全部输入。
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub table: TableSpec,
    /// 表名 -> 别名。
    pub alias: HashMap<String, String>,
    pub field: FieldSpec,
    pub where_: Vec<LogicGroup>,
    pub join: Vec<Join>,
    pub group: Vec<String>,
    pub having: String,
    pub order: Vec<OrderItem>,
    pub limit: Option<Limit>,
    pub lock: Lock,
    pub distinct: bool,
    pub union: Option<Union>,
    pub data: Vec<(String, DataValue)>,
    pub comment: String,
    pub soft_delete: Option<SoftDelete>,
    pub strict: bool,
    pub force: Vec<String>,
    /// 以 JSON 文本写入的字段。
    pub json: Vec<String>,
    /// DELETE ... USING 的表。
    pub using: Option<TableSpec>,
    /// 显式指定的字段绑定类型，优先于 schema 推断。
    pub bind_types: HashMap<String, BindType>,
}

impl QueryOptions {
    pub fn new(table: impl Into<TableSpec>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn table(&mut self, table: impl Into<TableSpec>) -> &mut Self {
        self.table = table.into();
        self
    }

    pub fn alias(&mut self, table: impl Into<String>, alias: impl Into<String>) -> &mut Self {
        self.alias.insert(table.into(), alias.into());
        self
    }

    pub fn field<I, F>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldItem>,
    {
        let items: Vec<FieldItem> = fields.into_iter().map(Into::into).collect();
        match &mut self.field {
            FieldSpec::List(list) => list.extend(items),
            FieldSpec::All => self.field = FieldSpec::List(items),
        }
        self
    }

    pub fn field_as(&mut self, name: impl Into<String>, alias: impl Into<String>) -> &mut Self {
        self.field([FieldItem::Alias {
            name: name.into(),
            alias: alias.into(),
        }])
    }

    /// 追加一个 AND 条件；同一逻辑词的条件归入同一分组。
    pub fn where_(&mut self, condition: Condition) -> &mut Self {
        self.push_condition(Logic::And, condition)
    }

    pub fn where_or(&mut self, condition: Condition) -> &mut Self {
        self.push_condition(Logic::Or, condition)
    }

    fn push_condition(&mut self, logic: Logic, condition: Condition) -> &mut Self {
        match self.where_.iter_mut().find(|g| g.logic == logic) {
            Some(group) => group.conditions.push(condition),
            None => self.where_.push(LogicGroup::new(logic, vec![condition])),
        }
        self
    }

    /// 追加一个独立分组，不与已有分组合并。
    pub fn where_group(&mut self, logic: Logic, conditions: Vec<Condition>) -> &mut Self {
        self.where_.push(LogicGroup::new(logic, conditions));
        self
    }

    pub fn join(&mut self, join: Join) -> &mut Self {
        self.join.push(join);
        self
    }

    pub fn group<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn having(&mut self, having: impl Into<String>) -> &mut Self {
        self.having = having.into();
        self
    }

    /// 追加排序项，参数按 [`OrderItem::parse`] 解析。
    pub fn order(&mut self, item: &str) -> &mut Self {
        self.order.push(OrderItem::parse(item));
        self
    }

    pub fn order_item(&mut self, item: OrderItem) -> &mut Self {
        self.order.push(item);
        self
    }

    pub fn order_raw(&mut self, sql: impl Into<String>) -> &mut Self {
        self.order.push(OrderItem::Raw(Expr::raw(sql)));
        self
    }

    pub fn order_rand(&mut self) -> &mut Self {
        self.order.push(OrderItem::Rand);
        self
    }

    pub fn limit(&mut self, length: u64) -> &mut Self {
        self.limit = Some(Limit {
            offset: None,
            length,
        });
        self
    }

    pub fn limit_offset(&mut self, offset: u64, length: u64) -> &mut Self {
        self.limit = Some(Limit {
            offset: Some(offset),
            length,
        });
        self
    }

    /// 分页，`page` 从 1 开始。
    pub fn page(&mut self, page: u64, size: u64) -> &mut Self {
        self.limit_offset(page.saturating_sub(1).saturating_mul(size), size)
    }

    pub fn lock(&mut self, lock: Lock) -> &mut Self {
        self.lock = lock;
        self
    }

    pub fn distinct(&mut self, distinct: bool) -> &mut Self {
        self.distinct = distinct;
        self
    }

    pub fn union(&mut self, item: UnionItem, all: bool) -> &mut Self {
        let union = self.union.get_or_insert_with(Union::default);
        union.all = all;
        union.items.push(item);
        self
    }

    /// 设置写入数据；同名字段覆盖原值并保持原位置。
    pub fn data(&mut self, field: impl Into<String>, value: impl Into<DataValue>) -> &mut Self {
        let field = field.into();
        let value = value.into();
        match self.data.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.data.push((field, value)),
        }
        self
    }

    pub fn comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = comment.into();
        self
    }

    pub fn soft_delete(&mut self, field: impl Into<String>, criterion: Criterion) -> &mut Self {
        self.soft_delete = Some(SoftDelete {
            field: field.into(),
            criterion,
        });
        self
    }

    pub fn strict(&mut self, strict: bool) -> &mut Self {
        self.strict = strict;
        self
    }

    pub fn force<I, S>(&mut self, indexes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.force.extend(indexes.into_iter().map(Into::into));
        self
    }

    pub fn json<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.json.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn using(&mut self, table: impl Into<TableSpec>) -> &mut Self {
        self.using = Some(table.into());
        self
    }

    pub fn bind_type(&mut self, field: impl Into<String>, ty: BindType) -> &mut Self {
        self.bind_types.insert(field.into(), ty);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn table_spec_parses_aliases() {
        let spec = TableSpec::parse("user u, profile AS p,log");
        assert_eq!(
            spec.0,
            vec![
                TableRef::aliased("user", "u"),
                TableRef::aliased("profile", "p"),
                TableRef::new("log"),
            ]
        );
        assert_eq!(spec.primary(), Some("user"));
        assert_eq!(spec.table_for_alias("p"), Some("profile"));
        assert_eq!(spec.table_for_alias("x"), None);
    }

    #[test]
    fn conditions_group_by_logic() {
        let mut opts = QueryOptions::new("t");
        opts.where_(Condition::eq("a", 1))
            .where_or(Condition::eq("b", 2))
            .where_(Condition::eq("c", 3));
        assert_eq!(opts.where_.len(), 2);
        assert_eq!(opts.where_[0].logic, Logic::And);
        assert_eq!(opts.where_[0].conditions.len(), 2);
        assert_eq!(opts.where_[1].logic, Logic::Or);
    }

    #[test]
    fn order_item_parsing() {
        assert_eq!(OrderItem::parse("[rand]"), OrderItem::Rand);
        assert_eq!(
            OrderItem::parse("id desc"),
            OrderItem::Field {
                field: "id".into(),
                sort: Some("desc".into())
            }
        );
        assert_eq!(
            OrderItem::parse("name"),
            OrderItem::Field {
                field: "name".into(),
                sort: None
            }
        );
    }

    #[test]
    fn page_offsets_saturate() {
        let mut opts = QueryOptions::new("t");
        opts.page(3, 10);
        assert_eq!(opts.limit, Some(Limit { offset: Some(20), length: 10 }));
        opts.page(u64::MAX, u64::MAX);
        assert_eq!(opts.limit.and_then(|l| l.offset), Some(u64::MAX));
        opts.page(0, 10);
        assert_eq!(opts.limit.and_then(|l| l.offset), Some(0));
    }

    #[test]
    fn data_overwrites_in_place() {
        let mut opts = QueryOptions::new("t");
        opts.data("a", 1).data("b", 2).data("a", 3);
        let keys: Vec<&str> = opts.data.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn page_computes_offset() {
        let mut opts = QueryOptions::default();
        opts.page(3, 20);
        assert_eq!(
            opts.limit,
            Some(Limit {
                offset: Some(40),
                length: 20
            })
        );
    }
}
