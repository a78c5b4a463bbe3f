//! 条件树的数据模型：逻辑分组、条件、条件值。
//!
//! 条件与值都是封闭枚举，编译器对每种形态穷尽匹配，
//! 无法识别的组合直接报错而不是静默降级。

use std::fmt;
use std::sync::Arc;

use crate::expr::Expr;
use crate::options::QueryOptions;
use crate::value::SqlValue;
use crate::valuer::SqlValuer;

/// 逻辑连接词。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Logic {
    #[default]
    And,
    Or,
}

impl Logic {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// 只识别 `AND`/`and`/`OR`/`or` 四种写法。
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AND" | "and" => Some(Self::And),
            "OR" | "or" => Some(Self::Or),
            _ => None,
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 延迟执行的查询构造函数，编译时在嵌套上下文中对一份新的 `QueryOptions` 调用。
#[derive(Clone)]
pub struct Subquery(Arc<dyn Fn(&mut QueryOptions) + Send + Sync>);

impl Subquery {
    pub fn new(f: impl Fn(&mut QueryOptions) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub(crate) fn apply(&self, options: &mut QueryOptions) {
        (self.0)(options)
    }
}

impl fmt::Debug for Subquery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Subquery(..)")
    }
}

/// 条件右侧的值。
#[derive(Debug, Clone)]
pub enum WhereValue {
    Value(SqlValue),
    List(Vec<SqlValue>),
    Raw(Expr),
    Subquery(Subquery),
    /// `COLUMN` 运算符的 (比较符, 另一个字段)。
    Column { op: String, field: String },
    /// 引用同一上下文中已绑定的参数名（不含冒号）。
    Param(String),
    Valuer(Box<dyn SqlValuer>),
}

impl WhereValue {
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SqlValue>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    pub fn valuer(v: impl SqlValuer + 'static) -> Self {
        Self::Valuer(Box::new(v))
    }
}

macro_rules! impl_where_value_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for WhereValue {
                fn from(v: $t) -> Self {
                    Self::Value(v.into())
                }
            }
        )*
    };
}

impl_where_value_scalar!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    String,
    &'static str,
    time::OffsetDateTime,
);

impl From<SqlValue> for WhereValue {
    fn from(v: SqlValue) -> Self {
        Self::Value(v)
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for WhereValue {
    fn from(v: Vec<T>) -> Self {
        Self::list(v)
    }
}

impl<T: Into<SqlValue>, const N: usize> From<[T; N]> for WhereValue {
    fn from(v: [T; N]) -> Self {
        Self::list(v)
    }
}

impl From<Expr> for WhereValue {
    fn from(v: Expr) -> Self {
        Self::Raw(v)
    }
}

impl From<Subquery> for WhereValue {
    fn from(v: Subquery) -> Self {
        Self::Subquery(v)
    }
}

/// 运算符 + 值 + 可选逻辑词（LIKE 列表的连接词）。
#[derive(Debug, Clone)]
pub struct Criterion {
    pub op: String,
    pub value: WhereValue,
    pub logic: Option<Logic>,
}

impl Criterion {
    pub fn new(op: impl Into<String>, value: impl Into<WhereValue>) -> Self {
        Self {
            op: op.into(),
            value: value.into(),
            logic: None,
        }
    }

    pub fn with_logic(mut self, logic: Logic) -> Self {
        self.logic = Some(logic);
        self
    }
}

/// 同一字段多条件中的一项；末尾的 `Keyword` 决定各项之间的连接词。
#[derive(Debug, Clone)]
pub enum MultiItem {
    Criterion(Criterion),
    Keyword(String),
}

impl MultiItem {
    pub fn new(op: impl Into<String>, value: impl Into<WhereValue>) -> Self {
        Self::Criterion(Criterion::new(op, value))
    }

    pub fn keyword(k: impl Into<String>) -> Self {
        Self::Keyword(k.into())
    }
}

impl From<Criterion> for MultiItem {
    fn from(c: Criterion) -> Self {
        Self::Criterion(c)
    }
}

/// 一个条件。
#[derive(Debug, Clone)]
pub enum Condition {
    /// 单字段条件；字段中含 `|` / `&` 时展开为多字段同条件。
    Simple { field: String, criterion: Criterion },
    /// 同一字段上的多个条件。
    Multi { field: String, items: Vec<MultiItem> },
    /// 在嵌套上下文中编译其 where 树。
    Subquery(Subquery),
    Raw(Expr),
    /// 若干单字段条件，以 AND 连接后整体加括号。
    All(Vec<(String, Criterion)>),
}

impl Condition {
    pub fn new(
        field: impl Into<String>,
        op: impl Into<String>,
        value: impl Into<WhereValue>,
    ) -> Self {
        Self::Simple {
            field: field.into(),
            criterion: Criterion::new(op, value),
        }
    }

    /// 等值条件；值为 NULL 时转为 `IS NULL`。
    pub fn eq(field: impl Into<String>, value: impl Into<WhereValue>) -> Self {
        match value.into() {
            WhereValue::Value(SqlValue::Null) => Self::is_null(field),
            value => Self::new(field, "=", value),
        }
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::new(field, "NULL", SqlValue::Null)
    }

    pub fn not_null(field: impl Into<String>) -> Self {
        Self::new(field, "NOT NULL", SqlValue::Null)
    }

    /// 以 `logic` 连接的 LIKE 模式列表。
    pub fn like_any(
        field: impl Into<String>,
        patterns: impl Into<WhereValue>,
        logic: Logic,
    ) -> Self {
        Self::Simple {
            field: field.into(),
            criterion: Criterion::new("LIKE", patterns).with_logic(logic),
        }
    }

    pub fn in_(field: impl Into<String>, values: impl Into<WhereValue>) -> Self {
        Self::new(field, "IN", values)
    }

    pub fn between(
        field: impl Into<String>,
        low: impl Into<SqlValue>,
        high: impl Into<SqlValue>,
    ) -> Self {
        Self::new(field, "BETWEEN", WhereValue::List(vec![low.into(), high.into()]))
    }

    /// 字段与字段比较，不绑定参数。
    pub fn column(
        field: impl Into<String>,
        op: impl Into<String>,
        other: impl Into<String>,
    ) -> Self {
        Self::new(
            field,
            "COLUMN",
            WhereValue::Column {
                op: op.into(),
                field: other.into(),
            },
        )
    }

    pub fn exists(f: impl Fn(&mut QueryOptions) + Send + Sync + 'static) -> Self {
        Self::new("", "EXISTS", Subquery::new(f))
    }

    pub fn not_exists(f: impl Fn(&mut QueryOptions) + Send + Sync + 'static) -> Self {
        Self::new("", "NOT EXISTS", Subquery::new(f))
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(Expr::raw(sql))
    }

    pub fn nested(f: impl Fn(&mut QueryOptions) + Send + Sync + 'static) -> Self {
        Self::Subquery(Subquery::new(f))
    }

    pub fn multi<I>(field: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = MultiItem>,
    {
        Self::Multi {
            field: field.into(),
            items: items.into_iter().collect(),
        }
    }

    pub fn all<I, F>(items: I) -> Self
    where
        I: IntoIterator<Item = (F, Criterion)>,
        F: Into<String>,
    {
        Self::All(items.into_iter().map(|(f, c)| (f.into(), c)).collect())
    }
}

/// 一组以相同逻辑词连接的条件。
#[derive(Debug, Clone, Default)]
pub struct LogicGroup {
    pub logic: Logic,
    pub conditions: Vec<Condition>,
}

impl LogicGroup {
    pub fn new(logic: Logic, conditions: Vec<Condition>) -> Self {
        Self { logic, conditions }
    }
}
