//! 运算符分派表：规范化后的运算符 -> 处理函数。
//!
//! 内置运算符族在构造时注册且不可覆盖；扩展运算符通过
//! `CompilerBuilder::bind_parser` 在编译器构建前注册。

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use time::OffsetDateTime;

use crate::bind::BindType;
use crate::compiler::Compiler;
use crate::condition::{Logic, WhereValue};
use crate::context::QueryContext;
use crate::datetime::{coerce_datetime, owning_table};
use crate::error::{CompileError, Result};
use crate::value::SqlValue;

/// 传给运算符处理函数的参数。
#[derive(Debug, Clone, Copy)]
pub struct OperatorArgs<'a> {
    /// 已引用的字段表达式。
    pub key: &'a str,
    /// 规范化后的运算符。
    pub op: &'a str,
    pub value: &'a WhereValue,
    /// 原始字段名。
    pub field: &'a str,
    /// 参数基础名。
    pub bind_name: &'a str,
    pub bind_type: BindType,
    /// LIKE 列表的连接词。
    pub logic: Logic,
}

pub type OperatorHandler =
    Arc<dyn Fn(&Compiler, &mut QueryContext, &OperatorArgs<'_>) -> Result<String> + Send + Sync>;

type BuiltinHandler = fn(&Compiler, &mut QueryContext, &OperatorArgs<'_>) -> Result<String>;

const BUILTIN: &[(&str, &[&str], BuiltinHandler)] = &[
    ("compare", &["=", "<>", ">", ">=", "<", "<="], parse_compare),
    ("like", &["LIKE", "NOT LIKE"], parse_like),
    ("between", &["BETWEEN", "NOT BETWEEN"], parse_between),
    ("in", &["IN", "NOT IN"], parse_in),
    ("exp", &["EXP"], parse_exp),
    ("null", &["NULL", "NOT NULL"], parse_null),
    ("between_time", &["BETWEEN TIME", "NOT BETWEEN TIME"], parse_between_time),
    ("time", &["< TIME", "> TIME", "<= TIME", ">= TIME"], parse_time),
    ("exists", &["EXISTS", "NOT EXISTS"], parse_exists),
    ("column", &["COLUMN"], parse_column),
];

const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("EQ", "="),
    ("NEQ", "<>"),
    ("GT", ">"),
    ("EGT", ">="),
    ("LT", "<"),
    ("ELT", "<="),
    ("NOTLIKE", "NOT LIKE"),
    ("NOTIN", "NOT IN"),
    ("NOTBETWEEN", "NOT BETWEEN"),
    ("NOTEXISTS", "NOT EXISTS"),
    ("NOTNULL", "NOT NULL"),
    ("NOTBETWEEN TIME", "NOT BETWEEN TIME"),
];

const COMPARE_OPS: &[&str] = &["=", "<>", ">", ">=", "<", "<="];

/// 运算符表。
#[derive(Clone)]
pub struct OperatorRegistry {
    aliases: HashMap<String, String>,
    handlers: HashMap<String, (String, OperatorHandler)>,
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorRegistry")
            .field("tokens", &self.tokens().collect::<BTreeSet<_>>())
            .field("aliases", &self.aliases.len())
            .finish()
    }
}

impl OperatorRegistry {
    /// 只含内置运算符与内置别名的表。
    pub fn new() -> Self {
        let mut handlers = HashMap::new();
        for (family, tokens, handler) in BUILTIN {
            let handler: OperatorHandler = Arc::new(*handler);
            for token in *tokens {
                handlers.insert(token.to_string(), (family.to_string(), Arc::clone(&handler)));
            }
        }
        let aliases = BUILTIN_ALIASES
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        Self { aliases, handlers }
    }

    pub fn is_builtin(token: &str) -> bool {
        BUILTIN.iter().any(|(_, tokens, _)| tokens.contains(&token))
            || BUILTIN_ALIASES.iter().any(|(from, _)| *from == token)
    }

    /// 去首尾空白、转大写，再查别名。
    pub fn normalize(&self, op: &str) -> String {
        let op = op.trim().to_uppercase();
        match self.aliases.get(&op) {
            Some(to) => to.clone(),
            None => op,
        }
    }

    pub fn resolve(&self, token: &str) -> Option<&OperatorHandler> {
        self.handlers.get(token).map(|(_, h)| h)
    }

    /// 运算符所属的处理族。
    pub fn family(&self, token: &str) -> Option<&str> {
        self.handlers.get(token).map(|(f, _)| f.as_str())
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub(crate) fn register(&mut self, family: &str, tokens: &[&str], handler: OperatorHandler) -> Result<()> {
        let tokens: Vec<String> = tokens.iter().map(|t| t.trim().to_uppercase()).collect();
        if let Some(reserved) = tokens.iter().find(|t| Self::is_builtin(t)) {
            return Err(CompileError::ReservedOperator(reserved.clone()));
        }
        for token in tokens {
            self.handlers
                .insert(token, (family.to_string(), Arc::clone(&handler)));
        }
        Ok(())
    }

    pub(crate) fn alias(&mut self, from: &str, to: &str) -> Result<()> {
        let from = from.trim().to_uppercase();
        if Self::is_builtin(&from) {
            return Err(CompileError::ReservedOperator(from));
        }
        let to = self.normalize(to);
        if !self.handlers.contains_key(&to) {
            return Err(CompileError::UnknownOperator(to));
        }
        self.aliases.insert(from, to);
        Ok(())
    }
}

/// 把标量类的值渲染为操作数：已绑定参数 `:name`、原始表达式原样、子查询加括号，
/// 其余标量在此绑定。
pub fn render_operand(
    compiler: &Compiler,
    ctx: &mut QueryContext,
    args: &OperatorArgs<'_>,
    value: &WhereValue,
) -> Result<String> {
    match value {
        WhereValue::Param(name) => Ok(format!(":{name}")),
        WhereValue::Raw(e) => Ok(e.to_string()),
        WhereValue::Value(v) => Ok(format!(
            ":{}",
            ctx.bind(args.bind_name, v.clone(), args.bind_type)
        )),
        WhereValue::Valuer(v) => Ok(format!(
            ":{}",
            ctx.bind(args.bind_name, v.value()?, args.bind_type)
        )),
        WhereValue::Subquery(sq) => Ok(format!("( {} )", compiler.compile_subquery(ctx, sq)?)),
        WhereValue::List(_) | WhereValue::Column { .. } => Err(CompileError::malformed(format!(
            "`{} {}` expects a scalar value",
            args.field, args.op
        ))),
    }
}

/// 两端值或逗号分隔的字符串展开为值列表。
fn value_list(args: &OperatorArgs<'_>) -> Result<Vec<SqlValue>> {
    let scalar = match args.value {
        WhereValue::List(items) => return Ok(items.clone()),
        WhereValue::Value(v) => v.clone(),
        WhereValue::Valuer(v) => v.value()?,
        _ => {
            return Err(CompileError::malformed(format!(
                "`{} {}` expects a list value",
                args.field, args.op
            )));
        }
    };
    Ok(match scalar {
        SqlValue::String(s) => s
            .split(',')
            .map(|part| SqlValue::from(part.trim().to_string()))
            .collect(),
        other => vec![other],
    })
}

fn two_bounds(args: &OperatorArgs<'_>) -> Result<(SqlValue, SqlValue)> {
    let mut bounds = value_list(args)?;
    if bounds.len() != 2 {
        return Err(CompileError::malformed(format!(
            "`{} {}` expects exactly two bounds, got {}",
            args.field,
            args.op,
            bounds.len()
        )));
    }
    let high = bounds.pop().unwrap_or(SqlValue::Null);
    let low = bounds.pop().unwrap_or(SqlValue::Null);
    Ok((low, high))
}

fn parse_compare(c: &Compiler, ctx: &mut QueryContext, a: &OperatorArgs<'_>) -> Result<String> {
    let operand = render_operand(c, ctx, a, a.value)?;
    Ok(format!("{} {} {}", a.key, a.op, operand))
}

fn parse_like(c: &Compiler, ctx: &mut QueryContext, a: &OperatorArgs<'_>) -> Result<String> {
    let WhereValue::List(patterns) = a.value else {
        let operand = render_operand(c, ctx, a, a.value)?;
        return Ok(format!("{} {} {}", a.key, a.op, operand));
    };
    if patterns.is_empty() {
        return Err(CompileError::malformed(format!(
            "`{} {}` got an empty pattern list",
            a.field, a.op
        )));
    }
    let parts: Vec<String> = patterns
        .iter()
        .enumerate()
        .map(|(k, p)| {
            let name = ctx.bind(&format!("{}_{k}", a.bind_name), p.clone(), a.bind_type);
            format!("{} {} :{name}", a.key, a.op)
        })
        .collect();
    Ok(format!("({})", parts.join(&format!(" {} ", a.logic))))
}

fn parse_between(_: &Compiler, ctx: &mut QueryContext, a: &OperatorArgs<'_>) -> Result<String> {
    let (low, high) = two_bounds(a)?;
    let low = ctx.bind(&format!("{}_between_1", a.bind_name), low, a.bind_type);
    let high = ctx.bind(&format!("{}_between_2", a.bind_name), high, a.bind_type);
    Ok(format!("{} {} :{low} AND :{high}", a.key, a.op))
}

fn parse_in(c: &Compiler, ctx: &mut QueryContext, a: &OperatorArgs<'_>) -> Result<String> {
    let zone = match a.value {
        WhereValue::Subquery(sq) => c.compile_subquery(ctx, sq)?,
        WhereValue::Raw(e) => e.to_string(),
        WhereValue::Param(name) => format!(":{name}"),
        _ => {
            let mut seen = std::collections::HashSet::new();
            let items: Vec<SqlValue> = value_list(a)?
                .into_iter()
                .filter(|v| seen.insert(v.to_text()))
                .collect();
            if items.is_empty() {
                "''".to_string()
            } else {
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| {
                        let name = ctx.bind(&format!("{}_in_{}", a.bind_name, i + 1), v, a.bind_type);
                        format!(":{name}")
                    })
                    .collect::<Vec<_>>()
                    .join(",")
            }
        }
    };
    Ok(format!("{} {} ({})", a.key, a.op, zone))
}

fn parse_exp(_: &Compiler, _: &mut QueryContext, a: &OperatorArgs<'_>) -> Result<String> {
    match a.value {
        WhereValue::Raw(e) => Ok(format!("( {} {} )", a.key, e)),
        _ => Err(CompileError::malformed(format!(
            "`{} EXP` requires a raw expression",
            a.field
        ))),
    }
}

fn parse_null(_: &Compiler, _: &mut QueryContext, a: &OperatorArgs<'_>) -> Result<String> {
    Ok(format!("{} IS {}", a.key, a.op))
}

fn parse_exists(c: &Compiler, ctx: &mut QueryContext, a: &OperatorArgs<'_>) -> Result<String> {
    let sql = match a.value {
        WhereValue::Subquery(sq) => c.compile_subquery(ctx, sq)?,
        WhereValue::Raw(e) => e.to_string(),
        _ => {
            return Err(CompileError::malformed(format!(
                "`{}` requires a subquery or raw expression",
                a.op
            )));
        }
    };
    Ok(format!("{} ({})", a.op, sql))
}

fn parse_column(c: &Compiler, _: &mut QueryContext, a: &OperatorArgs<'_>) -> Result<String> {
    let WhereValue::Column { op, field } = a.value else {
        return Err(CompileError::malformed(format!(
            "`{} COLUMN` requires an (operator, field) pair",
            a.field
        )));
    };
    let op = op.trim();
    if !COMPARE_OPS.contains(&op) {
        return Err(CompileError::malformed(format!(
            "`{op}` is not allowed in a field comparison"
        )));
    }
    Ok(format!("( {} {} {} )", a.key, op, c.quote(field)))
}

/// 时间条件的值：按字段类型转换后绑定。
fn time_operand(
    c: &Compiler,
    ctx: &mut QueryContext,
    a: &OperatorArgs<'_>,
    value: &SqlValue,
    bind_name: &str,
) -> String {
    let (table, column) = owning_table(ctx.options(), a.field);
    let field_type = table.and_then(|t| c.schema().field_type(&t, column));
    let value = coerce_datetime(field_type.as_deref(), value, OffsetDateTime::now_utc());
    format!(":{}", ctx.bind(bind_name, value, a.bind_type))
}

fn strip_time_tag(op: &str) -> &str {
    op.strip_suffix(" TIME").unwrap_or(op)
}

fn parse_time(c: &Compiler, ctx: &mut QueryContext, a: &OperatorArgs<'_>) -> Result<String> {
    let op = strip_time_tag(a.op);
    let operand = match a.value {
        WhereValue::Value(v) => time_operand(c, ctx, a, v, a.bind_name),
        WhereValue::Valuer(v) => {
            let v = v.value()?;
            time_operand(c, ctx, a, &v, a.bind_name)
        }
        other => render_operand(c, ctx, a, other)?,
    };
    Ok(format!("{} {} {}", a.key, op, operand))
}

fn parse_between_time(c: &Compiler, ctx: &mut QueryContext, a: &OperatorArgs<'_>) -> Result<String> {
    let op = strip_time_tag(a.op);
    let (low, high) = two_bounds(a)?;
    let low = time_operand(c, ctx, a, &low, &format!("{}_between_1", a.bind_name));
    let high = time_operand(c, ctx, a, &high, &format!("{}_between_2", a.bind_name));
    Ok(format!("{} {} {} AND {}", a.key, op, low, high))
}
