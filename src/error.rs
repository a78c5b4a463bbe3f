//! 编译错误：一次编译要么得到完整的 SQL 与绑定表，要么得到其中一种错误。

use crate::valuer::ValuerError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// 条件结构无法识别、字段比较的运算符不合法、标量运算符收到列表值等。
    #[error("where express error: {0}")]
    MalformedCondition(String),
    /// 严格模式下写入了不在允许列表中的字段。
    #[error("fields not exists: [{0}]")]
    UnknownField(String),
    #[error("where express error: unknown operator `{0}`")]
    UnknownOperator(String),
    /// 子查询（嵌套上下文）编译失败。
    #[error("subquery error: {0}")]
    Subquery(Box<CompileError>),
    #[error("invalid data for field `{field}`: {reason}")]
    InvalidData { field: String, reason: String },
    #[error("invalid {clause} clause: {reason}")]
    InvalidClause {
        clause: &'static str,
        reason: String,
    },
    /// 试图覆盖内置运算符或内置别名。
    #[error("operator `{0}` is reserved")]
    ReservedOperator(String),
    #[error("no data to write")]
    EmptyData,
    #[error(transparent)]
    Valuer(#[from] ValuerError),
}

impl CompileError {
    pub(crate) fn subquery(err: CompileError) -> Self {
        Self::Subquery(Box::new(err))
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedCondition(msg.into())
    }
}

pub type Result<T, E = CompileError> = std::result::Result<T, E>;
