// 型レジストリ
// 実行時の TypeId からメタデータを引くためのプロセス全体のテーブル

use super::{Reflect, TypeInfo};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

/// TypeId からメタデータへの対応表
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: RwLock<HashMap<TypeId, &'static TypeInfo>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Reflect` 実装型を登録（登録済みなら何もしない）
    pub fn register<T: Reflect>(&self) -> &'static TypeInfo {
        let info = T::type_info();
        self.types
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(info.desc().id())
            .or_insert(info);
        info
    }

    /// 実行時の型からメタデータを取得
    pub fn lookup(&self, id: TypeId) -> Option<&'static TypeInfo> {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
    }
}

/// グローバルレジストリのシングルトン
static GLOBAL_REGISTRY: OnceLock<TypeRegistry> = OnceLock::new();

/// グローバル型レジストリを取得
pub fn type_registry() -> &'static TypeRegistry {
    GLOBAL_REGISTRY.get_or_init(TypeRegistry::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::{MethodInfo, TypeDesc};

    struct Marker;

    impl Reflect for Marker {
        fn type_info() -> &'static TypeInfo {
            static INFO: OnceLock<TypeInfo> = OnceLock::new();
            INFO.get_or_init(|| {
                let desc = TypeDesc::reference::<Marker>("Marker");
                TypeInfo::new(
                    desc,
                    vec![MethodInfo::instance::<Marker, _>(
                        "Ping",
                        desc,
                        vec![],
                        None,
                        |_, _| Ok(None),
                    )],
                )
            })
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = TypeRegistry::new();
        assert!(registry.lookup(TypeId::of::<Marker>()).is_none());

        registry.register::<Marker>();
        registry.register::<Marker>();

        let info = registry.lookup(TypeId::of::<Marker>()).unwrap();
        assert_eq!(info.name(), "Marker");
        assert_eq!(registry.types.read().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_type_lookup() {
        let registry = TypeRegistry::new();
        assert!(registry.lookup(TypeId::of::<String>()).is_none());
    }

    #[test]
    fn test_global_registry_is_shared() {
        type_registry().register::<Marker>();
        assert!(type_registry().lookup(TypeId::of::<Marker>()).is_some());
    }

    #[test]
    fn test_register_after_poisoned_lock() {
        let registry = TypeRegistry::new();
        std::thread::scope(|scope| {
            let result = scope
                .spawn(|| {
                    let _guard = registry.types.write().unwrap();
                    panic!("書き込み中に失敗");
                })
                .join();
            assert!(result.is_err());
        });
        assert!(registry.types.is_poisoned());

        registry.register::<Marker>();
        assert_eq!(
            registry.lookup(TypeId::of::<Marker>()).map(|info| info.name()),
            Some("Marker")
        );
    }
}
