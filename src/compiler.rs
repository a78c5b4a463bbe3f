//! 编译器与构建器。
//!
//! `Compiler` 在 `build()` 之后只读，可以放进 `Arc` 在多线程间共享；
//! 每次编译的可变状态都在 [`QueryContext`] 中。

use std::sync::Arc;

use crate::bind::{BindTable, BindType};
use crate::context::QueryContext;
use crate::error::Result;
use crate::flavor::{Flavor, default_flavor};
use crate::operator::{OperatorArgs, OperatorRegistry};
use crate::schema::{FlavorResolver, IdentifierResolver, NoSchema, SchemaProvider};

/// 一条编译完成的语句：带 `:name` 占位符的 SQL 与有序绑定表。
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub binds: BindTable,
}

/// 查询编译器。
#[derive(Clone)]
pub struct Compiler {
    flavor: Flavor,
    operators: OperatorRegistry,
    schema: Arc<dyn SchemaProvider>,
    resolver: Arc<dyn IdentifierResolver>,
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("flavor", &self.flavor)
            .field("operators", &self.operators)
            .finish_non_exhaustive()
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Compiler {
    pub fn new(flavor: Flavor) -> Self {
        Self::builder().flavor(flavor).build()
    }

    pub fn builder() -> CompilerBuilder {
        CompilerBuilder::default()
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    pub fn schema(&self) -> &dyn SchemaProvider {
        self.schema.as_ref()
    }

    pub fn resolver(&self) -> &dyn IdentifierResolver {
        self.resolver.as_ref()
    }

    pub(crate) fn quote(&self, name: &str) -> String {
        self.resolver.quote_identifier(name)
    }

    /// 字段的绑定类型：显式指定优先，其次按 schema 推断，默认字符串。
    pub(crate) fn bind_type(&self, ctx: &QueryContext, field: &str) -> BindType {
        if let Some(ty) = ctx.options().bind_types.get(field) {
            return *ty;
        }
        let (table, column) = crate::datetime::owning_table(ctx.options(), field);
        table
            .and_then(|t| self.schema.field_type(&t, column))
            .map(|ty| BindType::from_sql_type(&ty))
            .unwrap_or_default()
    }

    pub(crate) fn finish(&self, kind: &'static str, sql: String, ctx: QueryContext) -> CompiledQuery {
        let binds = ctx.into_binds();
        tracing::debug!(
            kind,
            flavor = %self.flavor,
            sql_len = sql.len(),
            binds = binds.len(),
            "statement compiled"
        );
        CompiledQuery { sql, binds }
    }
}

/// `Compiler` 的构建器：方言、schema、标识符规则与扩展运算符。
#[derive(Default)]
pub struct CompilerBuilder {
    flavor: Option<Flavor>,
    schema: Option<Arc<dyn SchemaProvider>>,
    resolver: Option<Arc<dyn IdentifierResolver>>,
    operators: OperatorRegistry,
}

impl CompilerBuilder {
    /// 未指定时使用 [`default_flavor`]。
    pub fn flavor(mut self, flavor: Flavor) -> Self {
        self.flavor = Some(flavor);
        self
    }

    pub fn schema(mut self, schema: impl SchemaProvider + 'static) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }

    /// 未指定时使用当前方言的 [`FlavorResolver`]。
    pub fn resolver(mut self, resolver: impl IdentifierResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// 注册一个运算符族；`tokens` 中任何一个是内置运算符都会返回 `ReservedOperator`。
    pub fn bind_parser<F>(mut self, name: &str, tokens: &[&str], handler: F) -> Result<Self>
    where
        F: Fn(&Compiler, &mut QueryContext, &OperatorArgs<'_>) -> Result<String>
            + Send
            + Sync
            + 'static,
    {
        self.operators.register(name, tokens, Arc::new(handler))?;
        Ok(self)
    }

    /// 注册运算符别名。
    pub fn alias(mut self, from: &str, to: &str) -> Result<Self> {
        self.operators.alias(from, to)?;
        Ok(self)
    }

    pub fn build(self) -> Compiler {
        let flavor = self.flavor.unwrap_or_else(default_flavor);
        Compiler {
            flavor,
            operators: self.operators,
            schema: self.schema.unwrap_or_else(|| Arc::new(NoSchema)),
            resolver: self
                .resolver
                .unwrap_or_else(|| Arc::new(FlavorResolver::new(flavor))),
        }
    }
}
