//! 参数名分配：保证一次编译中的参数名互不冲突。

use std::collections::HashMap;

use crate::bind::BindTable;

/// 每次编译独立持有的参数名分配器，冲突时追加 `_<序号>`，序号单调递增且可指定起点。
#[derive(Debug, Clone)]
pub struct ParamAllocator {
    next: u64,
}

impl Default for ParamAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamAllocator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    /// 下一个将被使用的序号。
    pub fn peek(&self) -> u64 {
        self.next
    }

    pub(crate) fn advance_to(&mut self, next: u64) {
        self.next = self.next.max(next);
    }

    /// 基础名含有 `[A-Za-z0-9_]` 以外的字符时替换为其 md5 十六进制摘要。
    pub fn normalize(base: &str) -> String {
        if !base.is_empty()
            && base
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            base.to_string()
        } else {
            format!("{:x}", md5::compute(base.as_bytes()))
        }
    }

    /// 返回一个在 `binds` 中尚未出现的参数名。
    pub fn allocate(&mut self, base: &str, binds: &BindTable) -> String {
        let base = Self::normalize(base);
        if !binds.is_bound(&base) {
            return base;
        }
        loop {
            let candidate = format!("{base}_{}", self.next);
            self.next += 1;
            if !binds.is_bound(&candidate) {
                return candidate;
            }
        }
    }
}

/// 单遍改写 SQL 片段中的 `:name` 占位符，`renames` 之外的名字、`::` 类型转换
/// 以及单引号字符串字面量内的文本保持不变。
pub(crate) fn rewrite_placeholders(sql: &str, renames: &HashMap<String, String>) -> String {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len() + 8);
    let mut last = 0;
    let mut i = 0;
    let mut in_literal = false;
    while i < bytes.len() {
        let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
        // `''` 转义会连续切换两次，状态不变。
        if bytes[i] == b'\'' {
            in_literal = !in_literal;
            i += 1;
            continue;
        }
        if in_literal {
            i += 1;
            continue;
        }
        if bytes[i] == b':' && (i == 0 || (bytes[i - 1] != b':' && !is_word(bytes[i - 1]))) {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && is_word(bytes[end]) {
                end += 1;
            }
            if end > start {
                if let Some(new) = renames.get(&sql[start..end]) {
                    out.push_str(&sql[last..start]);
                    out.push_str(new);
                    last = end;
                }
                i = end;
                continue;
            }
        }
        i += 1;
    }
    out.push_str(&sql[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::BindType;
    use pretty_assertions::assert_eq;

    #[test]
    fn free_base_is_used_as_is() {
        let mut alloc = ParamAllocator::new();
        assert_eq!(alloc.allocate("where_AND_a", &BindTable::new()), "where_AND_a");
        assert_eq!(alloc.peek(), 1);
    }

    #[test]
    fn collisions_take_counter_suffix() {
        let mut binds = BindTable::new();
        let mut alloc = ParamAllocator::starting_at(7);
        let first = alloc.allocate("a", &binds);
        binds.try_insert(first.clone(), 1_i64, BindType::Int);
        let second = alloc.allocate("a", &binds);
        binds.try_insert(second.clone(), 2_i64, BindType::Int);
        let third = alloc.allocate("a", &binds);
        assert_eq!((first.as_str(), second.as_str(), third.as_str()), ("a", "a_7", "a_8"));
    }

    #[test]
    fn non_word_bases_are_hashed() {
        let name = ParamAllocator::normalize("where_AND_名字");
        assert_eq!(name.len(), 32);
        assert!(name.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(name, ParamAllocator::normalize("where_AND_名字"));
        assert_eq!(ParamAllocator::normalize("data__a_b"), "data__a_b");
    }

    #[test]
    fn rewrite_is_single_pass_and_word_bounded() {
        let renames = HashMap::from([
            ("a".to_string(), "a_1".to_string()),
            ("a_1".to_string(), "a_2".to_string()),
        ]);
        assert_eq!(
            rewrite_placeholders("x = :a AND y = :a_1 AND z = :ab AND w = v::a", &renames),
            "x = :a_1 AND y = :a_2 AND z = :ab AND w = v::a"
        );
    }

    #[test]
    fn rewrite_leaves_string_literals_alone() {
        let renames = HashMap::from([("a".to_string(), "a_1".to_string())]);
        assert_eq!(
            rewrite_placeholders("x = ':a' AND y = :a AND z = 'it''s :a' AND w = :a", &renames),
            "x = ':a' AND y = :a_1 AND z = 'it''s :a' AND w = :a_1"
        );
    }
}
