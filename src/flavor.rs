//! SQL Flavor（方言）：控制标识符引用、LIMIT 写法、随机排序、JSON 路径与批量插入等行为。

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard};

/// 编译器支持的方言。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Flavor {
    #[default]
    MySQL,
    PostgreSQL,
    SQLite,
}

static DEFAULT_FLAVOR: AtomicU8 = AtomicU8::new(Flavor::MySQL as u8);
static DEFAULT_FLAVOR_LOCK: Mutex<()> = Mutex::new(());

impl Flavor {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::PostgreSQL,
            2 => Self::SQLite,
            _ => Self::MySQL,
        }
    }

    fn to_u8(self) -> u8 {
        self as u8
    }
}

/// 获取当前全局默认 Flavor，`CompilerBuilder` 未指定方言时使用。
pub fn default_flavor() -> Flavor {
    Flavor::from_u8(DEFAULT_FLAVOR.load(Ordering::Relaxed))
}

/// 设置全局默认 Flavor，返回旧值。
pub fn set_default_flavor(flavor: Flavor) -> Flavor {
    let old = DEFAULT_FLAVOR.swap(flavor.to_u8(), Ordering::Relaxed);
    Flavor::from_u8(old)
}

/// 修改全局默认 Flavor 的 RAII guard（会持有一个全局锁，避免并行测试互相干扰）。
pub struct DefaultFlavorGuard {
    _lock: MutexGuard<'static, ()>,
    old: Flavor,
}

impl Drop for DefaultFlavorGuard {
    fn drop(&mut self) {
        set_default_flavor(self.old);
    }
}

/// 在一个作用域内临时设置 DefaultFlavor，并保证退出作用域后自动恢复。
pub fn set_default_flavor_scoped(flavor: Flavor) -> DefaultFlavorGuard {
    let lock = DEFAULT_FLAVOR_LOCK
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    let old = set_default_flavor(flavor);
    DefaultFlavorGuard { _lock: lock, old }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MySQL => "MySQL",
            Self::PostgreSQL => "PostgreSQL",
            Self::SQLite => "SQLite",
        };
        f.write_str(s)
    }
}

impl Flavor {
    /// 为单个标识符片段加引号。
    pub fn quote(self, name: &str) -> String {
        match self {
            Self::MySQL => format!("`{name}`"),
            Self::PostgreSQL | Self::SQLite => format!("\"{name}\""),
        }
    }

    /// 随机排序函数。
    pub fn rand(self) -> &'static str {
        match self {
            Self::MySQL => "rand()",
            Self::PostgreSQL | Self::SQLite => "random()",
        }
    }

    /// 渲染 LIMIT 子句（带前导空格）。
    pub fn limit(self, offset: Option<u64>, length: u64) -> String {
        match (self, offset) {
            (_, None) => format!(" LIMIT {length}"),
            (Self::PostgreSQL, Some(offset)) => format!(" LIMIT {length} OFFSET {offset}"),
            (Self::MySQL | Self::SQLite, Some(offset)) => format!(" LIMIT {offset},{length}"),
        }
    }

    /// 读取 JSON 字段中的路径，`col` 已加引号，`path` 形如 `a.b`。
    pub fn json_extract(self, col: &str, path: &str) -> String {
        match self {
            Self::MySQL | Self::SQLite => format!("json_extract({col}, '$.{path}')"),
            Self::PostgreSQL => format!("({col} #>> '{{{}}}')", path.replace('.', ",")),
        }
    }

    /// 写入 JSON 字段中的若干路径，`sets` 为 (路径, 占位符)。
    pub fn json_set(self, col: &str, sets: &[(String, String)]) -> String {
        match self {
            Self::MySQL | Self::SQLite => {
                let mut out = format!("json_set({col}");
                for (path, ph) in sets {
                    out.push_str(&format!(", '$.{path}', {ph}"));
                }
                out.push(')');
                out
            }
            Self::PostgreSQL => sets.iter().fold(col.to_string(), |acc, (path, ph)| {
                format!(
                    "jsonb_set({acc}, '{{{}}}', to_jsonb({ph}))",
                    path.replace('.', ",")
                )
            }),
        }
    }

    /// 批量插入是否使用多行 VALUES；否则使用 `SELECT ... UNION ALL SELECT ...`。
    pub fn supports_multi_values(self) -> bool {
        match self {
            Self::MySQL | Self::PostgreSQL => true,
            Self::SQLite => false,
        }
    }
}
