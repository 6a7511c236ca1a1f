// 計測対象の型
// 中身が空のメソッドを1つだけ持ち、全ストラテジーがこのメソッドに到達するまでのコストを測る

use crate::reflection::{MethodInfo, Reflect, TypeDesc, TypeInfo};
use std::sync::OnceLock;

/// 計測対象メソッドの名前
pub const TARGET_METHOD: &str = "DoSomething";

/// 計測対象になれる型
///
/// 直接呼び出しと、名前で解決される呼び出しが同じメソッドへ到達するよう、
/// 両方を同じ実装で宣言する
pub trait BenchTarget: Reflect {
    /// メタデータ上の対象メソッド名
    const MEMBER: &'static str;

    /// 対象メソッドを静的に呼び出す
    fn call_direct(&self);
}

/// 計測対象の最小オブジェクト
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Foo;

impl Foo {
    pub fn new() -> Self {
        Self
    }

    /// 何もしない対象メソッド
    ///
    /// インライン展開されると直接呼び出しの計測が消えるため禁止する
    #[inline(never)]
    pub fn do_something(&self) {}
}

impl Reflect for Foo {
    fn type_info() -> &'static TypeInfo {
        static INFO: OnceLock<TypeInfo> = OnceLock::new();
        INFO.get_or_init(|| {
            let desc = TypeDesc::reference::<Foo>("Foo");
            TypeInfo::new(
                desc,
                vec![MethodInfo::instance::<Foo, _>(
                    TARGET_METHOD,
                    desc,
                    vec![],
                    None,
                    |this, _| {
                        this.do_something();
                        Ok(None)
                    },
                )],
            )
        })
    }
}

impl BenchTarget for Foo {
    const MEMBER: &'static str = TARGET_METHOD;

    #[inline]
    fn call_direct(&self) {
        self.do_something();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;

    #[test]
    fn test_foo_metadata() {
        let info = TypeInfo::of::<Foo>();
        let method = info.get_method(TARGET_METHOD).unwrap();

        assert_eq!(info.name(), "Foo");
        assert!(!info.desc().is_value_type());
        assert!(method.parameters().is_empty());
        assert!(method.return_type().is_none());
        assert!(!method.is_static());
    }

    #[test]
    fn test_member_is_registered() {
        assert!(TypeInfo::of::<Foo>().get_method(Foo::MEMBER).is_ok());
        Foo::new().call_direct();
    }

    #[test]
    fn test_reflective_call_returns_null() {
        let foo = Foo::new();
        let method = TypeInfo::of::<Foo>().get_method(TARGET_METHOD).unwrap();

        let result = method.invoke(Some(&foo as &dyn Any), &[]).unwrap();
        assert!(result.is_none());
    }
}
