//! 绑定参数表：参数名 -> (值, 声明类型)，保持插入顺序，编译期间只追加不覆盖。

use std::collections::HashMap;

use crate::value::SqlValue;

/// 驱动层使用的参数类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BindType {
    #[default]
    Str,
    Int,
    Float,
    Bool,
    Null,
    Lob,
}

impl BindType {
    /// 按字段的声明类型（如 `int(11)`、`decimal(10,2)`、`varchar(32)`）推断绑定类型。
    pub fn from_sql_type(ty: &str) -> Self {
        let ty = ty.to_ascii_lowercase();
        let base = ty.split('(').next().unwrap_or_default().trim();
        if base.contains("bool") {
            Self::Bool
        } else if ["double", "float", "decimal", "real", "numeric"]
            .iter()
            .any(|k| base.contains(k))
        {
            Self::Float
        } else if base.contains("int") || base.contains("serial") || base == "bit" {
            Self::Int
        } else if base.contains("blob") || base.contains("binary") || base == "bytea" {
            Self::Lob
        } else {
            Self::Str
        }
    }
}

/// 一条绑定记录。
#[derive(Debug, Clone, PartialEq)]
pub struct BindEntry {
    pub name: String,
    pub value: SqlValue,
    pub ty: BindType,
}

/// 有序绑定表。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindTable {
    entries: Vec<BindEntry>,
    index: HashMap<String, usize>,
}

impl BindTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&BindEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// 按名称取值，测试和驱动适配层常用。
    pub fn value(&self, name: &str) -> Option<&SqlValue> {
        self.get(name).map(|e| &e.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BindEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// 追加一条绑定。名称已存在时不覆盖，返回 `false`。
    pub fn try_insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<SqlValue>,
        ty: BindType,
    ) -> bool {
        let name = name.into();
        if self.index.contains_key(&name) {
            return false;
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(BindEntry {
            name,
            value: value.into(),
            ty,
        });
        true
    }

    pub fn into_entries(self) -> Vec<BindEntry> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a BindTable {
    type Item = &'a BindEntry;
    type IntoIter = std::slice::Iter<'a, BindEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
