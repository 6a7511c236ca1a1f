// 式木 -> クロージャのコンパイラ
// 各ノードを事前に評価手順へ落とし込み、呼び出し時は木を辿らない

use super::{CallExpr, Delegate, Expr};
use crate::core::{InvokeError, InvokeResult};
use crate::reflection::{unbox_ref, ArgRefs, Boxed, MethodInfo};
use smallvec::SmallVec;
use std::any::Any;
use std::sync::Arc;

/// コンパイル済みのオペランド
enum Operand {
    Constant(Arc<dyn Any + Send + Sync>),
    Computed(Delegate),
}

/// 評価済みのオペランド
enum Evaluated<'a> {
    Borrowed(&'a dyn Any),
    Owned(Boxed),
}

impl Operand {
    fn evaluate(&self) -> InvokeResult<Evaluated<'_>> {
        match self {
            Self::Constant(value) => Ok(Evaluated::Borrowed(shared_ref(value))),
            Self::Computed(delegate) => delegate()?
                .map(Evaluated::Owned)
                .ok_or_else(|| InvokeError::invalid_expression("void の結果をオペランドに使用しました")),
        }
    }
}

impl Evaluated<'_> {
    fn as_any(&self) -> &dyn Any {
        match self {
            Self::Borrowed(value) => *value,
            Self::Owned(value) => unbox_ref(value),
        }
    }
}

fn shared_ref(value: &Arc<dyn Any + Send + Sync>) -> &dyn Any {
    let value: &(dyn Any + Send + Sync) = &**value;
    value
}

/// ラムダ本体をコンパイル
pub(super) fn compile_lambda(body: &Expr) -> InvokeResult<Delegate> {
    match body {
        Expr::Call(call) => Ok(compile_call(call)),
        Expr::Constant(_) => Err(InvokeError::invalid_expression(
            "ラムダ本体はメソッド呼び出しである必要があります",
        )),
    }
}

fn compile_operand(expr: &Expr) -> Operand {
    match expr {
        Expr::Constant(constant) => Operand::Constant(constant.value.clone()),
        Expr::Call(call) => Operand::Computed(compile_call(call)),
    }
}

fn compile_call(call: &CallExpr) -> Delegate {
    let method = call.method;
    let instance = call.instance.as_deref().map(compile_operand);
    let arguments: Vec<Operand> = call.arguments.iter().map(compile_operand).collect();

    // 引数なしで定数レシーバー（または静的）の呼び出しは、直接呼び出し口へ束縛する
    if arguments.is_empty() {
        match instance {
            Some(Operand::Constant(target)) => {
                return Arc::new(move || method.call_entry(Some(shared_ref(&target)), &[]));
            }
            None => return Arc::new(move || method.call_entry(None, &[])),
            Some(computed) => {
                return Arc::new(move || invoke_with_operands(method, Some(&computed), &[]));
            }
        }
    }

    Arc::new(move || invoke_with_operands(method, instance.as_ref(), &arguments))
}

fn invoke_with_operands(
    method: &MethodInfo,
    instance: Option<&Operand>,
    arguments: &[Operand],
) -> InvokeResult<Option<Boxed>> {
    let receiver = instance.map(Operand::evaluate).transpose()?;

    let mut values: SmallVec<[Evaluated<'_>; 4]> = SmallVec::with_capacity(arguments.len());
    for argument in arguments {
        values.push(argument.evaluate()?);
    }
    let refs: ArgRefs<'_> = values.iter().map(|value| value.as_any()).collect();

    method.call_entry(receiver.as_ref().map(|value| value.as_any()), &refs)
}
