//! SqlValuer：编译阶段才求值的参数。
//!
//! 适用于自带文本表示的业务对象（如金额、枚举），编译时调用一次 `value()`，
//! 结果再按普通标量参与绑定。

use crate::value::SqlValue;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("builder sql valuer error: {0}")]
pub struct ValuerError(pub String);

/// 可在编译阶段动态计算实际值的 trait。
pub trait SqlValuer: dyn_clone::DynClone + std::fmt::Debug + Send + Sync {
    fn value(&self) -> Result<SqlValue, ValuerError>;
}

dyn_clone::clone_trait_object!(SqlValuer);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Cents(i64);

    impl SqlValuer for Cents {
        fn value(&self) -> Result<SqlValue, ValuerError> {
            if self.0 < 0 {
                return Err(ValuerError("negative amount".into()));
            }
            Ok(SqlValue::String(format!("{}.{:02}", self.0 / 100, self.0 % 100).into()))
        }
    }

    #[test]
    fn boxed_valuer_clones_and_evaluates() {
        let v: Box<dyn SqlValuer> = Box::new(Cents(1234));
        let cloned = v.clone();
        assert_eq!(cloned.value(), Ok(SqlValue::from("12.34")));
        assert!(Cents(-1).value().is_err());
    }
}
