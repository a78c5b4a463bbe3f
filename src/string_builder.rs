//! 字符串拼接工具与 `%NAME%` 模板填充。

#[derive(Debug, Default, Clone)]
pub(crate) struct StringBuilder {
    buf: String,
}

impl StringBuilder {
    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            buf: String::with_capacity(n),
        }
    }

    pub(crate) fn write_str(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    /// 以 `sep` 连接非空片段。
    pub(crate) fn write_strings(&mut self, items: &[String], sep: &str) {
        let mut first_added = false;
        for s in items {
            if s.is_empty() {
                continue;
            }
            if first_added {
                self.buf.push_str(sep);
            }
            self.buf.push_str(s);
            first_added = true;
        }
    }

    pub(crate) fn into_string(self) -> String {
        self.buf
    }
}

/// 单遍替换模板中的 `%NAME%` 槽位。替换进来的文本不会再被扫描，
/// 未知槽位与孤立的 `%` 原样保留。
pub(crate) fn fill_template(template: &str, slots: &[(&str, &str)]) -> String {
    let extra: usize = slots.iter().map(|(_, v)| v.len()).sum();
    let mut buf = StringBuilder::with_capacity(template.len() + extra);
    let mut rest = template;
    while let Some(start) = rest.find('%') {
        buf.write_str(&rest[..start]);
        let after = &rest[start + 1..];
        let slot = after
            .find('%')
            .map(|end| &after[..end])
            .and_then(|name| slots.iter().find(|(n, _)| *n == name).map(|(n, v)| (n.len(), *v)));
        match slot {
            Some((len, value)) => {
                buf.write_str(value);
                rest = &after[len + 1..];
            }
            None => {
                buf.write_str("%");
                rest = after;
            }
        }
    }
    buf.write_str(rest);
    buf.into_string()
}
