//! 実行時メタデータとリフレクション呼び出し
//!
//! 型ごとにメソッド記述子（名前・宣言型・引数・戻り値・静的かどうか）を登録し、
//! 名前による検索と汎用の `invoke(receiver, args)` を提供する。
//! 式木・コード生成・動的ディスパッチはすべてこの記述子を入力にする。

pub mod registry;

use crate::core::{InvokeError, InvokeResult};
use smallvec::SmallVec;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

pub use registry::{type_registry, TypeRegistry};

/// 汎用のボックス化された値
pub type Boxed = Box<dyn Any + Send + Sync>;

/// 型付きシムに渡す引数参照の一時バッファ
pub(crate) type ArgRefs<'a> = SmallVec<[&'a dyn Any; 4]>;

/// 型消去されたネイティブ呼び出し口
///
/// レシーバーと引数は呼び出し側で型検査済みの前提だが、
/// シム自身もダウンキャストに失敗すれば `InvalidCast` を返す
pub type MethodEntry =
    Arc<dyn Fn(Option<&dyn Any>, &[&dyn Any]) -> InvokeResult<Option<Boxed>> + Send + Sync>;

/// 型の記述子
#[derive(Clone, Copy)]
pub struct TypeDesc {
    id: TypeId,
    name: &'static str,
    is_value_type: bool,
}

impl TypeDesc {
    /// 参照型（共有されたインスタンスを介して扱う型）
    pub fn reference<T: Any>(name: &'static str) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name,
            is_value_type: false,
        }
    }

    /// 値型（コピーされる型）
    pub fn value<T: Any>(name: &'static str) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name,
            is_value_type: true,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_value_type(&self) -> bool {
        self.is_value_type
    }

    /// 値がこの型かどうか
    pub fn is_instance(&self, value: &dyn Any) -> bool {
        value.type_id() == self.id
    }

    /// 型検査付きで値を通す（`unbox.any` / `castclass` 相当）
    pub fn cast<'a>(&self, value: &'a dyn Any) -> InvokeResult<&'a dyn Any> {
        if self.is_instance(value) {
            Ok(value)
        } else {
            Err(InvokeError::InvalidCast {
                expected: self.name,
            })
        }
    }
}

impl PartialEq for TypeDesc {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDesc {}

impl fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 引数の記述子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterInfo {
    pub name: &'static str,
    pub ty: TypeDesc,
}

impl ParameterInfo {
    pub fn new(name: &'static str, ty: TypeDesc) -> Self {
        Self { name, ty }
    }
}

/// メソッドの記述子
#[derive(Clone)]
pub struct MethodInfo {
    name: &'static str,
    declaring_type: TypeDesc,
    parameters: Vec<ParameterInfo>,
    return_type: Option<TypeDesc>,
    is_static: bool,
    entry: MethodEntry,
}

impl MethodInfo {
    /// インスタンスメソッドを登録
    ///
    /// `body` は具象レシーバーを受け取り、ボックス化済みの戻り値を返す
    pub fn instance<T, F>(
        name: &'static str,
        declaring_type: TypeDesc,
        parameters: Vec<ParameterInfo>,
        return_type: Option<TypeDesc>,
        body: F,
    ) -> Self
    where
        T: Any,
        F: Fn(&T, &[&dyn Any]) -> InvokeResult<Option<Boxed>> + Send + Sync + 'static,
    {
        let expected = declaring_type.name();
        let entry: MethodEntry = Arc::new(move |receiver: Option<&dyn Any>, args: &[&dyn Any]| {
            let this = receiver
                .ok_or(InvokeError::NullReceiver { method: name })?
                .downcast_ref::<T>()
                .ok_or(InvokeError::InvalidCast { expected })?;
            body(this, args)
        });
        Self {
            name,
            declaring_type,
            parameters,
            return_type,
            is_static: false,
            entry,
        }
    }

    /// 静的メソッドを登録
    pub fn static_method<F>(
        name: &'static str,
        declaring_type: TypeDesc,
        parameters: Vec<ParameterInfo>,
        return_type: Option<TypeDesc>,
        body: F,
    ) -> Self
    where
        F: Fn(&[&dyn Any]) -> InvokeResult<Option<Boxed>> + Send + Sync + 'static,
    {
        Self {
            name,
            declaring_type,
            parameters,
            return_type,
            is_static: true,
            entry: Arc::new(move |_: Option<&dyn Any>, args: &[&dyn Any]| body(args)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn declaring_type(&self) -> TypeDesc {
        self.declaring_type
    }

    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.parameters
    }

    /// 戻り値の型（`None` は void）
    pub fn return_type(&self) -> Option<TypeDesc> {
        self.return_type
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// メタデータ API 経由の汎用呼び出し
    ///
    /// 毎回レシーバー・引数の数・引数の型を検証してから呼び出す
    pub fn invoke(&self, receiver: Option<&dyn Any>, args: &[Boxed]) -> InvokeResult<Option<Boxed>> {
        let receiver = if self.is_static {
            None
        } else {
            let receiver = receiver.ok_or(InvokeError::NullReceiver { method: self.name })?;
            Some(self.declaring_type.cast(receiver)?)
        };

        if args.len() != self.parameters.len() {
            return Err(InvokeError::ArgumentCount {
                method: self.name,
                expected: self.parameters.len(),
                actual: args.len(),
            });
        }

        let mut refs = ArgRefs::new();
        for (arg, parameter) in args.iter().zip(&self.parameters) {
            refs.push(parameter.ty.cast(unbox_ref(arg))?);
        }

        (self.entry)(receiver, &refs)
    }

    /// 検証済みの引数でネイティブ呼び出し口を直接呼ぶ
    pub(crate) fn call_entry(
        &self,
        receiver: Option<&dyn Any>,
        args: &[&dyn Any],
    ) -> InvokeResult<Option<Boxed>> {
        (self.entry)(receiver, args)
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("declaring_type", &self.declaring_type)
            .field("parameters", &self.parameters)
            .field("return_type", &self.return_type)
            .field("is_static", &self.is_static)
            .finish()
    }
}

/// 型のメタデータ
#[derive(Debug)]
pub struct TypeInfo {
    desc: TypeDesc,
    methods: Vec<MethodInfo>,
}

impl TypeInfo {
    pub fn new(desc: TypeDesc, methods: Vec<MethodInfo>) -> Self {
        Self { desc, methods }
    }

    /// `Reflect` 実装型のメタデータを取得
    pub fn of<T: Reflect>() -> &'static TypeInfo {
        T::type_info()
    }

    pub fn desc(&self) -> TypeDesc {
        self.desc
    }

    pub fn name(&self) -> &'static str {
        self.desc.name()
    }

    /// 名前でメソッドを検索
    pub fn get_method(&self, name: &str) -> InvokeResult<&MethodInfo> {
        self.methods
            .iter()
            .find(|method| method.name() == name)
            .ok_or_else(|| InvokeError::member_not_found(self.desc.name(), name))
    }
}

/// 実行時メタデータを公開する型
pub trait Reflect: Any + Send + Sync {
    /// プロセス全体で共有されるメタデータ
    fn type_info() -> &'static TypeInfo
    where
        Self: Sized;
}

/// `Box<dyn Any + Send + Sync>` から `&dyn Any` を取り出す
pub(crate) fn unbox_ref(value: &Boxed) -> &dyn Any {
    let value: &(dyn Any + Send + Sync) = &**value;
    value
}
