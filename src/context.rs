//! 编译上下文：一次编译独享的查询选项、绑定表与参数名分配器。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::allocator::{ParamAllocator, rewrite_placeholders};
use crate::bind::{BindTable, BindType};
use crate::options::QueryOptions;
use crate::value::SqlValue;

/// 单次编译的可变状态。
///
/// 子查询使用 [`QueryContext::new_nested_context`] 创建的独立上下文编译，
/// 再由 [`QueryContext::merge_nested`] 把绑定并回父上下文。
#[derive(Debug, Clone)]
pub struct QueryContext {
    options: Arc<QueryOptions>,
    binds: BindTable,
    allocator: ParamAllocator,
}

impl QueryContext {
    pub fn new(options: QueryOptions) -> Self {
        Self::from_shared(Arc::new(options))
    }

    pub fn from_shared(options: Arc<QueryOptions>) -> Self {
        Self {
            options,
            binds: BindTable::new(),
            allocator: ParamAllocator::new(),
        }
    }

    /// 带有预先绑定的参数，条件中可以通过 `WhereValue::Param` 引用它们。
    pub fn with_binds(mut self, binds: BindTable) -> Self {
        self.binds = binds;
        self
    }

    pub fn with_allocator(mut self, allocator: ParamAllocator) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub(crate) fn shared_options(&self) -> Arc<QueryOptions> {
        Arc::clone(&self.options)
    }

    pub(crate) fn options_mut(&mut self) -> &mut QueryOptions {
        Arc::make_mut(&mut self.options)
    }

    pub fn binds(&self) -> &BindTable {
        &self.binds
    }

    pub fn into_binds(self) -> BindTable {
        self.binds
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.binds.is_bound(name)
    }

    /// 以 `name` 为基础名绑定一个值，返回实际使用的参数名（不含冒号）。
    pub fn bind(&mut self, name: &str, value: impl Into<SqlValue>, ty: BindType) -> String {
        let name = self.allocator.allocate(name, &self.binds);
        self.binds.try_insert(name.clone(), value, ty);
        name
    }

    pub fn bind_batch<I, S>(&mut self, entries: I) -> Vec<String>
    where
        I: IntoIterator<Item = (S, SqlValue, BindType)>,
        S: AsRef<str>,
    {
        entries
            .into_iter()
            .map(|(name, value, ty)| self.bind(name.as_ref(), value, ty))
            .collect()
    }

    /// 子查询使用的上下文：继承表与别名，绑定表为空，分配器从父上下文的序号继续。
    pub fn new_nested_context(&self) -> QueryContext {
        let options = QueryOptions {
            table: self.options.table.clone(),
            alias: self.options.alias.clone(),
            ..QueryOptions::default()
        };
        QueryContext {
            options: Arc::new(options),
            binds: BindTable::new(),
            allocator: ParamAllocator::starting_at(self.allocator.peek()),
        }
    }

    /// 合并子上下文的绑定；与父上下文重名的参数改名，并同步改写 `fragment` 中的占位符。
    pub fn merge_nested(&mut self, child: QueryContext, fragment: &mut String) {
        self.allocator.advance_to(child.allocator.peek());
        let child_names: HashSet<String> = child.binds.names().map(str::to_string).collect();
        let mut renames = HashMap::new();
        for entry in child.binds.into_entries() {
            let mut name = entry.name.clone();
            if self.binds.is_bound(&name) {
                name = loop {
                    let candidate = self.allocator.allocate(&entry.name, &self.binds);
                    if !child_names.contains(&candidate) {
                        break candidate;
                    }
                };
                renames.insert(entry.name, name.clone());
            }
            self.binds.try_insert(name, entry.value, entry.ty);
        }
        if !renames.is_empty() {
            tracing::trace!(renamed = renames.len(), "nested context merged with renames");
            *fragment = rewrite_placeholders(fragment, &renames);
        }
    }
}
