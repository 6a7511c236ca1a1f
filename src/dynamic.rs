//! 遅延束縛の動的ディスパッチ
//!
//! 呼び出しのたびにレシーバーの実行時型を調べ、呼び出しサイトごとの
//! 単相キャッシュが外れたときだけ型レジストリからメンバーを解決し直す。

use crate::core::{InvokeError, InvokeResult};
use crate::reflection::{type_registry, unbox_ref, ArgRefs, Boxed, MethodInfo, Reflect};
use std::any::{Any, TypeId};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// キャッシュ済みの束縛結果
#[derive(Clone, Copy)]
struct Binding {
    receiver: TypeId,
    method: &'static MethodInfo,
}

/// 名前で指定されたメンバー呼び出しの地点
pub struct CallSite {
    member: String,
    cache: RwLock<Option<Binding>>,
}

impl CallSite {
    pub fn new(member: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            cache: RwLock::new(None),
        }
    }

    /// レシーバーの実行時型でメンバーを解決して呼び出す
    pub fn invoke(&self, receiver: &dyn Any, args: &[Boxed]) -> InvokeResult<Option<Boxed>> {
        let method = self.resolve(receiver.type_id())?;

        if args.len() != method.parameters().len() {
            return Err(InvokeError::ArgumentCount {
                method: method.name(),
                expected: method.parameters().len(),
                actual: args.len(),
            });
        }
        let refs: ArgRefs<'_> = args.iter().map(unbox_ref).collect();

        method.call_entry(Some(receiver), &refs)
    }

    /// キャッシュ済みの束縛先（テスト・診断用）
    pub fn cached_receiver(&self) -> Option<TypeId> {
        let cached = *self.cache.read().unwrap_or_else(PoisonError::into_inner);
        cached.map(|binding| binding.receiver)
    }

    fn resolve(&self, receiver: TypeId) -> InvokeResult<&'static MethodInfo> {
        let cached = *self.cache.read().unwrap_or_else(PoisonError::into_inner);
        match cached {
            Some(binding) if binding.receiver == receiver => Ok(binding.method),
            _ => self.bind(receiver),
        }
    }

    /// キャッシュミス時の解決
    fn bind(&self, receiver: TypeId) -> InvokeResult<&'static MethodInfo> {
        let info = type_registry()
            .lookup(receiver)
            .ok_or_else(|| InvokeError::member_not_found("<unregistered>", self.member.as_str()))?;
        let method = info.get_method(&self.member)?;

        debug!(member = %self.member, receiver = info.name(), "call site rebound");
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) =
            Some(Binding { receiver, method });
        Ok(method)
    }
}

impl std::fmt::Debug for CallSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallSite")
            .field("member", &self.member)
            .field("bound", &self.cached_receiver().is_some())
            .finish()
    }
}

/// 静的な型情報を捨てた値
///
/// 生成時に実行時型をレジストリへ登録し、以降は名前だけでメンバーを呼ぶ
#[derive(Clone)]
pub struct DynamicObject {
    value: Arc<dyn Any + Send + Sync>,
}

impl DynamicObject {
    pub fn new<T: Reflect>(value: Arc<T>) -> Self {
        type_registry().register::<T>();
        Self { value }
    }

    /// メンバーを呼び出す
    pub fn invoke_member(&self, site: &CallSite, args: &[Boxed]) -> InvokeResult<Option<Boxed>> {
        let receiver: &(dyn Any + Send + Sync) = &*self.value;
        site.invoke(receiver, args)
    }

}

impl std::fmt::Debug for DynamicObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicObject").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::{ParameterInfo, TypeDesc, TypeInfo};
    use crate::target::{Foo, TARGET_METHOD};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::OnceLock;

    #[derive(Default)]
    struct Counter {
        hits: AtomicUsize,
    }

    impl Reflect for Counter {
        fn type_info() -> &'static TypeInfo {
            static INFO: OnceLock<TypeInfo> = OnceLock::new();
            INFO.get_or_init(|| {
                let desc = TypeDesc::reference::<Counter>("Counter");
                TypeInfo::new(
                    desc,
                    vec![
                        MethodInfo::instance::<Counter, _>(
                            TARGET_METHOD,
                            desc,
                            vec![],
                            None,
                            |this, _| {
                                this.hits.fetch_add(1, Ordering::SeqCst);
                                Ok(None)
                            },
                        ),
                        MethodInfo::instance::<Counter, _>(
                            "AddHits",
                            desc,
                            vec![ParameterInfo::new("n", TypeDesc::value::<usize>("usize"))],
                            None,
                            |this, args| {
                                let n = args[0]
                                    .downcast_ref::<usize>()
                                    .ok_or(InvokeError::InvalidCast { expected: "usize" })?;
                                this.hits.fetch_add(*n, Ordering::SeqCst);
                                Ok(None)
                            },
                        ),
                    ],
                )
            })
        }
    }

    #[test]
    fn test_invoke_member_by_name() {
        let counter = Arc::new(Counter::default());
        let object = DynamicObject::new(counter.clone());
        let site = CallSite::new(TARGET_METHOD);

        for _ in 0..3 {
            object.invoke_member(&site, &[]).unwrap();
        }

        assert_eq!(counter.hits.load(Ordering::SeqCst), 3);
        assert_eq!(site.cached_receiver(), Some(TypeId::of::<Counter>()));
    }

    #[test]
    fn test_call_site_rebinds_on_receiver_change() {
        let counter = DynamicObject::new(Arc::new(Counter::default()));
        let foo = DynamicObject::new(Arc::new(Foo::new()));
        let site = CallSite::new(TARGET_METHOD);

        counter.invoke_member(&site, &[]).unwrap();
        assert_eq!(site.cached_receiver(), Some(TypeId::of::<Counter>()));

        foo.invoke_member(&site, &[]).unwrap();
        assert_eq!(site.cached_receiver(), Some(TypeId::of::<Foo>()));
    }

    #[test]
    fn test_invoke_member_with_arguments() {
        let counter = Arc::new(Counter::default());
        let object = DynamicObject::new(counter.clone());
        let site = CallSite::new("AddHits");

        object.invoke_member(&site, &[Box::new(5usize)]).unwrap();

        assert_eq!(counter.hits.load(Ordering::SeqCst), 5);
        assert!(matches!(
            object.invoke_member(&site, &[]).unwrap_err(),
            InvokeError::ArgumentCount { expected: 1, .. }
        ));
    }

    #[test]
    fn test_call_site_recovers_from_poisoned_cache() {
        let counter = Arc::new(Counter::default());
        let object = DynamicObject::new(counter.clone());
        let site = CallSite::new(TARGET_METHOD);

        std::thread::scope(|scope| {
            let result = scope
                .spawn(|| {
                    let _guard = site.cache.write().unwrap();
                    panic!("書き込み中に失敗");
                })
                .join();
            assert!(result.is_err());
        });
        assert!(site.cache.is_poisoned());

        object.invoke_member(&site, &[]).unwrap();
        object.invoke_member(&site, &[]).unwrap();

        assert_eq!(counter.hits.load(Ordering::SeqCst), 2);
        assert_eq!(site.cached_receiver(), Some(TypeId::of::<Counter>()));
    }

    #[test]
    fn test_missing_member() {
        let object = DynamicObject::new(Arc::new(Foo::new()));
        let site = CallSite::new("DoNothing");

        assert_eq!(
            object.invoke_member(&site, &[]).unwrap_err(),
            InvokeError::member_not_found("Foo", "DoNothing")
        );
        assert!(site.cached_receiver().is_none());
    }
}
