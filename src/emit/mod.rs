//! 実行時コード生成によるトランポリン
//!
//! メソッド記述子から命令列を生成し、検証したうえで
//! `(レシーバー, 引数配列) -> ボックス化された戻り値` のクロージャへ落とし込む。
//!
//! ```text
//! ldarg.0; unbox.any T          ; インスタンスメソッドのみ
//! ldarg.1; ldc.i4 i; ldelem.ref ; 引数ごと
//! unbox.any Pi
//! call / callvirt M
//! ldnull | box R                ; void なら null
//! ret
//! ```

pub mod opcodes;
pub mod verifier;

use crate::core::{InvokeError, InvokeResult};
use crate::reflection::{unbox_ref, ArgRefs, Boxed, MethodInfo, TypeDesc};
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

pub use opcodes::{IlGenerator, OpCode};
pub use verifier::{verify, ArgumentLoad, CallKind, Plan, ResultKind};

/// 生成されたトランポリン
pub type Trampoline =
    Arc<dyn Fn(Option<&dyn Any>, &[Boxed]) -> InvokeResult<Option<Boxed>> + Send + Sync>;

/// 実行時に組み立てるメソッド
#[derive(Debug, Clone)]
pub struct DynamicMethod {
    name: String,
    owner: TypeDesc,
    il: IlGenerator,
}

impl DynamicMethod {
    pub fn new(name: impl Into<String>, owner: TypeDesc) -> Self {
        Self {
            name: name.into(),
            owner,
            il: IlGenerator::new(),
        }
    }

    pub fn il_generator(&mut self) -> &mut IlGenerator {
        &mut self.il
    }

    pub fn instructions(&self) -> &[OpCode] {
        self.il.instructions()
    }

    /// 命令列を検証してトランポリンを生成
    pub fn create_delegate(&self) -> InvokeResult<Trampoline> {
        let plan = verify(&self.name, self.il.instructions())?;
        debug!(
            method = %self.name,
            owner = self.owner.name(),
            instructions = self.il.instructions().len(),
            "trampoline compiled"
        );
        Ok(lower(plan))
    }
}

/// メソッド記述子からトランポリンを生成
pub fn wrap(method: &'static MethodInfo) -> InvokeResult<Trampoline> {
    emit_wrapper(method)?.create_delegate()
}

/// トランポリンの命令列を組み立てる
pub fn emit_wrapper(method: &'static MethodInfo) -> InvokeResult<DynamicMethod> {
    let declaring_type = method.declaring_type();
    let mut dm = DynamicMethod::new(method.name(), declaring_type);
    let il = dm.il_generator();

    if !method.is_static() {
        il.emit(OpCode::Ldarg0).emit(OpCode::UnboxAny(declaring_type));
    }
    for (i, parameter) in method.parameters().iter().enumerate() {
        let index = i32::try_from(i).map_err(|_| {
            InvokeError::invalid_program(method.name(), format!("引数が多すぎます: {i}"))
        })?;
        il.emit(OpCode::Ldarg1)
            .emit(OpCode::LdcI4(index))
            .emit(OpCode::LdelemRef)
            .emit(OpCode::UnboxAny(parameter.ty));
    }
    if method.is_static() || declaring_type.is_value_type() {
        il.emit(OpCode::Call(method));
    } else {
        il.emit(OpCode::Callvirt(method));
    }
    match method.return_type() {
        None => {
            il.emit(OpCode::Ldnull);
        }
        Some(ty) if ty.is_value_type() => {
            il.emit(OpCode::Box(ty));
        }
        Some(_) => {}
    }
    il.emit(OpCode::Ret);

    Ok(dm)
}

/// 検証済みの計画をクロージャへ変換
fn lower(plan: Plan) -> Trampoline {
    let Plan {
        receiver,
        arguments,
        method,
        call,
        result,
    } = plan;

    // 引数なしの形は配列走査を省いた専用のクロージャにする
    if arguments.is_empty() {
        return Arc::new(move |this: Option<&dyn Any>, _: &[Boxed]| {
            let this = load_receiver(method, receiver, call, this)?;
            let value = method.call_entry(this, &[])?;
            Ok(finish(result, value))
        });
    }

    Arc::new(move |this: Option<&dyn Any>, args: &[Boxed]| {
        let this = load_receiver(method, receiver, call, this)?;
        let mut refs = ArgRefs::with_capacity(arguments.len());
        for load in &arguments {
            let value = args.get(load.index).ok_or(InvokeError::IndexOutOfRange {
                index: load.index,
                len: args.len(),
            })?;
            refs.push(load.ty.cast(unbox_ref(value))?);
        }
        let value = method.call_entry(this, &refs)?;
        Ok(finish(result, value))
    })
}

/// `ldarg.0; unbox.any` と `callvirt` の null 検査
fn load_receiver<'a>(
    method: &MethodInfo,
    receiver: Option<TypeDesc>,
    call: CallKind,
    this: Option<&'a dyn Any>,
) -> InvokeResult<Option<&'a dyn Any>> {
    let Some(ty) = receiver else {
        return Ok(None);
    };
    match this {
        Some(value) => Ok(Some(ty.cast(value)?)),
        None if call == CallKind::Virtual || ty.is_value_type() => {
            Err(InvokeError::NullReceiver {
                method: method.name(),
            })
        }
        None => Ok(None),
    }
}

fn finish(result: ResultKind, value: Option<Boxed>) -> Option<Boxed> {
    match result {
        ResultKind::Null => None,
        ResultKind::Boxed | ResultKind::Reference => value,
    }
}
