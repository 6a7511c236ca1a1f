//! 式木
//!
//! 「定数インスタンス I 上でメソッド M を呼ぶ」といった抽象的な式を組み立て、
//! [`Lambda::compile`] でクロージャへ事前コンパイルする。
//! 型検査は式の構築時に行い、コンパイル後の呼び出しでは検査しない。

mod compiler;

use crate::core::{InvokeError, InvokeResult};
use crate::reflection::{Boxed, MethodInfo, Reflect, TypeDesc, TypeInfo};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// コンパイル済みの呼び出し可能オブジェクト
pub type Delegate = Arc<dyn Fn() -> InvokeResult<Option<Boxed>> + Send + Sync>;

/// 定数ノード
#[derive(Clone)]
pub struct ConstantExpr {
    value: Arc<dyn Any + Send + Sync>,
    ty: TypeDesc,
}

/// メソッド呼び出しノード
#[derive(Clone)]
pub struct CallExpr {
    instance: Option<Box<Expr>>,
    method: &'static MethodInfo,
    arguments: Vec<Expr>,
}

/// 式ノード
#[derive(Clone)]
pub enum Expr {
    Constant(ConstantExpr),
    Call(CallExpr),
}

impl Expr {
    /// 型記述子付きの定数
    pub fn constant<T: Any + Send + Sync>(value: Arc<T>, ty: TypeDesc) -> InvokeResult<Self> {
        if ty.id() != TypeId::of::<T>() {
            return Err(InvokeError::invalid_expression(format!(
                "定数の型が記述子 {} と一致しません",
                ty.name()
            )));
        }
        Ok(Self::Constant(ConstantExpr { value, ty }))
    }

    /// メタデータを持つ型の定数
    pub fn constant_of<T: Reflect>(value: Arc<T>) -> Self {
        Self::Constant(ConstantExpr {
            value,
            ty: TypeInfo::of::<T>().desc(),
        })
    }

    /// メソッド呼び出し
    ///
    /// インスタンスの有無・型、引数の数・型をここで検証する
    pub fn call(
        instance: Option<Expr>,
        method: &'static MethodInfo,
        arguments: Vec<Expr>,
    ) -> InvokeResult<Self> {
        match (&instance, method.is_static()) {
            (Some(_), true) => {
                return Err(InvokeError::invalid_expression(format!(
                    "静的メソッド {} にインスタンスは指定できません",
                    method.name()
                )))
            }
            (None, false) => {
                return Err(InvokeError::invalid_expression(format!(
                    "インスタンスメソッド {} にはインスタンスが必要です",
                    method.name()
                )))
            }
            (Some(instance), false) if instance.result_type() != Some(method.declaring_type()) => {
                return Err(InvokeError::invalid_expression(format!(
                    "インスタンスの型が {} ではありません",
                    method.declaring_type().name()
                )))
            }
            _ => {}
        }

        if arguments.len() != method.parameters().len() {
            return Err(InvokeError::ArgumentCount {
                method: method.name(),
                expected: method.parameters().len(),
                actual: arguments.len(),
            });
        }
        for (argument, parameter) in arguments.iter().zip(method.parameters()) {
            if argument.result_type() != Some(parameter.ty) {
                return Err(InvokeError::invalid_expression(format!(
                    "引数 {} の型が {} ではありません",
                    parameter.name,
                    parameter.ty.name()
                )));
            }
        }

        Ok(Self::Call(CallExpr {
            instance: instance.map(Box::new),
            method,
            arguments,
        }))
    }

    /// 式の評価結果の型（`None` は void）
    pub fn result_type(&self) -> Option<TypeDesc> {
        match self {
            Self::Constant(constant) => Some(constant.ty),
            Self::Call(call) => call.method.return_type(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(constant) => write!(f, "value({})", constant.ty.name()),
            Self::Call(call) => {
                match &call.instance {
                    Some(instance) => write!(f, "{instance}.")?,
                    None => write!(f, "{}.", call.method.declaring_type().name())?,
                }
                write!(f, "{}(", call.method.name())?;
                for (i, argument) in call.arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({self})")
    }
}

/// 引数なしのラムダ式
#[derive(Debug, Clone)]
pub struct Lambda {
    body: Expr,
}

impl Lambda {
    pub fn new(body: Expr) -> Self {
        Self { body }
    }

    /// 式木をクロージャへコンパイル
    pub fn compile(&self) -> InvokeResult<Delegate> {
        compiler::compile_lambda(&self.body)
    }
}
