//! 写入数据编译：字段 -> 值 的映射编译为 (引用后的字段, 赋值片段)。

use std::collections::HashMap;

use crate::compiler::Compiler;
use crate::context::QueryContext;
use crate::datetime::owning_table;
use crate::error::{CompileError, Result};
use crate::expr::Expr;
use crate::options::{FieldItem, FieldSpec, QueryOptions};
use crate::value::{SqlValue, format_number};
use crate::valuer::SqlValuer;

/// 写入的值。
#[derive(Debug, Clone)]
pub enum DataValue {
    Value(SqlValue),
    Raw(Expr),
    /// 引用同一上下文中已绑定的参数名。
    Param(String),
    Valuer(Box<dyn SqlValuer>),
    /// 结构化值：JSON 字段的对象/数组，或 `["INC", n]` / `["DEC", n]`。
    Structured(serde_json::Value),
}

impl DataValue {
    /// `col = col + step`。
    pub fn inc(step: impl Into<serde_json::Value>) -> Self {
        Self::Structured(serde_json::Value::Array(vec!["INC".into(), step.into()]))
    }

    /// `col = col - step`。
    pub fn dec(step: impl Into<serde_json::Value>) -> Self {
        Self::Structured(serde_json::Value::Array(vec!["DEC".into(), step.into()]))
    }

    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    pub fn valuer(v: impl SqlValuer + 'static) -> Self {
        Self::Valuer(Box::new(v))
    }
}

macro_rules! impl_data_value_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for DataValue {
                fn from(v: $t) -> Self {
                    Self::Value(v.into())
                }
            }
        )*
    };
}

impl_data_value_scalar!(
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

impl From<SqlValue> for DataValue {
    fn from(v: SqlValue) -> Self {
        Self::Value(v)
    }
}

impl From<Expr> for DataValue {
    fn from(v: Expr) -> Self {
        Self::Raw(v)
    }
}

impl<T: Into<DataValue>> From<Option<T>> for DataValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Value(SqlValue::Null))
    }
}

/// JSON 标量转为普通值，对象与数组保持结构化。
impl From<serde_json::Value> for DataValue {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match v {
            Json::Null => Self::Value(SqlValue::Null),
            Json::Bool(b) => Self::Value(b.into()),
            Json::Number(n) => Self::Value(
                n.as_i64()
                    .map(SqlValue::I64)
                    .or_else(|| n.as_u64().map(SqlValue::U64))
                    .unwrap_or_else(|| SqlValue::F64(n.as_f64().unwrap_or_default())),
            ),
            Json::String(s) => Self::Value(s.into()),
            other => Self::Structured(other),
        }
    }
}

/// 求值后的写入值。
enum Resolved<'a> {
    Raw(&'a Expr),
    Param(&'a str),
    Value(SqlValue),
    Structured(&'a serde_json::Value),
}

fn resolve(value: &DataValue) -> Result<Resolved<'_>> {
    Ok(match value {
        DataValue::Value(v) => Resolved::Value(v.clone()),
        DataValue::Raw(e) => Resolved::Raw(e),
        DataValue::Param(name) => Resolved::Param(name),
        DataValue::Valuer(v) => Resolved::Value(v.value()?),
        DataValue::Structured(json) => Resolved::Structured(json),
    })
}

/// `["INC", n]` / `["DEC", n]`（不区分大小写，n 为数字或数字字符串）。
fn step_of(v: &serde_json::Value) -> Option<(&'static str, f64)> {
    let [kind, n] = v.as_array()?.as_slice() else {
        return None;
    };
    let sign = match kind.as_str()?.to_ascii_uppercase().as_str() {
        "INC" => "+",
        "DEC" => "-",
        _ => return None,
    };
    let n = match n {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    Some((sign, n))
}

impl Compiler {
    /// 写入时用来校验字段的参考集合：`*` 取 schema 的全部字段，否则取查询字段列表。
    pub(crate) fn reference_fields(&self, options: &QueryOptions) -> Vec<String> {
        match &options.field {
            FieldSpec::All => options
                .table
                .primary()
                .map(|t| self.schema().table_fields(t))
                .unwrap_or_default(),
            FieldSpec::List(items) => items
                .iter()
                .filter_map(|item| match item {
                    FieldItem::Name(n) => Some(n.clone()),
                    FieldItem::Alias { name, .. } => Some(name.clone()),
                    FieldItem::Raw(_) => None,
                })
                .collect(),
        }
    }

    /// 显式声明的 JSON 字段，或 schema 类型为 `json` / `jsonb` 的字段（`t.col` 按别名找表）。
    fn is_json_field(&self, options: &QueryOptions, field: &str) -> bool {
        if options.json.iter().any(|f| f == field) {
            return true;
        }
        let (table, column) = owning_table(options, field);
        table
            .and_then(|t| self.schema().field_type(&t, column))
            .is_some_and(|ty| ty.trim().to_ascii_lowercase().starts_with("json"))
    }

    /// 编译写入数据，返回 (引用后的字段, 赋值片段)，顺序与输入一致。
    ///
    /// `fields` 为空时不做字段校验；`suffix` 追加在参数基础名之后（批量插入的行号）。
    pub fn compile_assignments(
        &self,
        ctx: &mut QueryContext,
        data: &[(String, DataValue)],
        fields: &[String],
        suffix: &str,
    ) -> Result<Vec<(String, String)>> {
        let options = ctx.shared_options();
        let mut out: Vec<(String, String)> = Vec::with_capacity(data.len());
        // 列 -> (out 中的位置, [(路径, 占位符)])
        let mut json_sets: HashMap<String, (usize, Vec<(String, String)>)> = HashMap::new();

        for (key, value) in data {
            let key = key.trim();
            let value = resolve(value)?;

            if let Some((col, path)) = key.split_once("->") {
                let (col, path) = (col.trim(), path.trim());
                let ph = match value {
                    Resolved::Raw(e) => e.to_string(),
                    Resolved::Param(name) => self.bound_param(ctx, key, name)?,
                    Resolved::Value(v) => format!(":{}", self.bind_data(ctx, col, v, suffix)),
                    Resolved::Structured(json) => {
                        format!(":{}", self.bind_data(ctx, col, json.to_string().into(), suffix))
                    }
                };
                match json_sets.get_mut(col) {
                    Some((_, sets)) => sets.push((path.to_string(), ph)),
                    None => {
                        json_sets.insert(col.to_string(), (out.len(), vec![(path.to_string(), ph)]));
                        out.push((self.quote(col), String::new()));
                    }
                }
                continue;
            }

            let exempt = match &value {
                Resolved::Raw(_) => true,
                Resolved::Structured(_) => self.is_json_field(&options, key),
                _ => false,
            };
            if !exempt
                && !key.contains('.')
                && !fields.is_empty()
                && !fields.iter().any(|f| f == key)
            {
                if options.strict {
                    return Err(CompileError::UnknownField(key.to_string()));
                }
                continue;
            }

            let item = self.quote(key);
            let fragment = match value {
                Resolved::Raw(e) => e.to_string(),
                Resolved::Param(name) => self.bound_param(ctx, key, name)?,
                Resolved::Value(SqlValue::Null) => "NULL".to_string(),
                Resolved::Value(v) => format!(":{}", self.bind_data(ctx, key, v, suffix)),
                Resolved::Structured(json) if self.is_json_field(&options, key) => {
                    format!(":{}", self.bind_data(ctx, key, json.to_string().into(), suffix))
                }
                Resolved::Structured(json) => match step_of(json) {
                    Some((sign, n)) => format!("{item} {sign} {}", format_number(n)),
                    None => {
                        return Err(CompileError::InvalidData {
                            field: key.to_string(),
                            reason: "structured value on a non-JSON field".into(),
                        });
                    }
                },
            };
            out.push((item, fragment));
        }

        for (col, (pos, sets)) in json_sets {
            let quoted = self.quote(&col);
            out[pos].1 = self.flavor().json_set(&quoted, &sets);
        }
        Ok(out)
    }

    fn bind_data(&self, ctx: &mut QueryContext, key: &str, value: SqlValue, suffix: &str) -> String {
        let base = format!("data__{}{suffix}", key.replace("->", "_").replace('.', "_"));
        let ty = self.bind_type(ctx, key);
        ctx.bind(&base, value, ty)
    }

    fn bound_param(&self, ctx: &QueryContext, key: &str, name: &str) -> Result<String> {
        if ctx.is_bound(name) {
            Ok(format!(":{name}"))
        } else {
            Err(CompileError::InvalidData {
                field: key.to_string(),
                reason: format!("parameter `{name}` is not bound"),
            })
        }
    }
}
