//! halo-query-compiler：把结构化查询选项编译为带 `:name` 占位符的参数化 SQL 与绑定参数表。
//!
//! 入口是 [`Compiler`]：通过 [`CompilerBuilder`] 指定方言、schema 与扩展运算符，
//! 再对 [`QueryOptions`] 调用 `select` / `insert` / `insert_all` / `update` / `delete`。

pub mod allocator;
pub mod bind;
pub mod clause;
pub mod compiler;
#[cfg(test)]
mod compiler_tests;
pub mod condition;
pub mod context;
pub mod data;
#[cfg(test)]
mod data_tests;
pub mod datetime;
pub mod delete;
pub mod error;
pub mod expr;
pub mod flavor;
#[cfg(test)]
mod flavor_tests;
pub mod insert;
pub mod operator;
pub mod options;
pub mod schema;
pub mod select;
pub mod string_builder;
pub mod update;
#[cfg(test)]
mod update_delete_tests;
pub mod value;
pub mod valuer;
pub mod where_clause;

pub use crate::allocator::ParamAllocator;
pub use crate::bind::{BindEntry, BindTable, BindType};
pub use crate::compiler::{CompiledQuery, Compiler, CompilerBuilder};
pub use crate::condition::{Condition, Criterion, Logic, LogicGroup, MultiItem, Subquery, WhereValue};
pub use crate::context::QueryContext;
pub use crate::data::DataValue;
pub use crate::datetime::{coerce_datetime, parse_datetime};
pub use crate::error::{CompileError, Result};
pub use crate::expr::{Expr, raw};
pub use crate::flavor::{Flavor, default_flavor, set_default_flavor, set_default_flavor_scoped};
pub use crate::operator::{OperatorArgs, OperatorHandler, OperatorRegistry, render_operand};
pub use crate::options::{
    FieldItem, FieldSpec, Join, JoinKind, Limit, Lock, OrderItem, QueryOptions, SoftDelete,
    TableRef, TableSpec, Union, UnionItem,
};
pub use crate::schema::{
    FlavorResolver, IdentifierResolver, NoSchema, PlainResolver, SchemaProvider, StaticSchema,
};
pub use crate::value::SqlValue;
pub use crate::valuer::{SqlValuer, ValuerError};
