// 命令列の検証
// 記号的にスタックを実行し、型の整合性を確かめながら実行計画を組み立てる

use super::opcodes::OpCode;
use crate::core::{InvokeError, InvokeResult};
use crate::reflection::{MethodInfo, TypeDesc};

/// 呼び出し命令の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Direct,
    Virtual,
}

/// 戻り値の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// void メソッド。null を返す
    Null,
    /// 値型をボックス化して返す
    Boxed,
    /// 参照型をそのまま返す
    Reference,
}

/// 引数配列からの読み出し
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentLoad {
    pub index: usize,
    pub ty: TypeDesc,
}

/// 検証済みの実行計画
#[derive(Debug, Clone)]
pub struct Plan {
    pub receiver: Option<TypeDesc>,
    pub arguments: Vec<ArgumentLoad>,
    pub method: &'static MethodInfo,
    pub call: CallKind,
    pub result: ResultKind,
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Receiver,
    Element(usize),
}

/// 記号スタックの要素
#[derive(Debug, Clone, Copy)]
enum Slot {
    Receiver,
    ArgumentArray,
    Int(i32),
    Element(usize),
    Unboxed { source: Source, ty: TypeDesc },
    CallResult(TypeDesc),
    Null,
    Object,
}

struct Verifier<'a> {
    name: &'a str,
    stack: Vec<Slot>,
    call: Option<(&'static MethodInfo, CallKind, Option<TypeDesc>, Vec<ArgumentLoad>)>,
}

impl Verifier<'_> {
    fn error(&self, position: usize, reason: impl std::fmt::Display) -> InvokeError {
        InvokeError::invalid_program(self.name, format!("IL_{position:04}: {reason}"))
    }

    fn pop(&mut self, position: usize) -> InvokeResult<Slot> {
        self.stack
            .pop()
            .ok_or_else(|| self.error(position, "スタックアンダーフロー"))
    }

    fn step(&mut self, position: usize, op: OpCode) -> InvokeResult<()> {
        match op {
            OpCode::Ldarg0 => self.stack.push(Slot::Receiver),
            OpCode::Ldarg1 => self.stack.push(Slot::ArgumentArray),
            OpCode::LdcI4(value) => self.stack.push(Slot::Int(value)),
            OpCode::LdelemRef => {
                let index = match self.pop(position)? {
                    Slot::Int(value) => usize::try_from(value)
                        .map_err(|_| self.error(position, format!("負の添字 {value}")))?,
                    other => return Err(self.error(position, format!("添字が必要です: {other:?}"))),
                };
                match self.pop(position)? {
                    Slot::ArgumentArray => self.stack.push(Slot::Element(index)),
                    other => return Err(self.error(position, format!("配列が必要です: {other:?}"))),
                }
            }
            OpCode::UnboxAny(ty) => {
                let source = match self.pop(position)? {
                    Slot::Receiver => Source::Receiver,
                    Slot::Element(index) => Source::Element(index),
                    other => {
                        return Err(self.error(position, format!("オブジェクト参照が必要です: {other:?}")))
                    }
                };
                self.stack.push(Slot::Unboxed { source, ty });
            }
            OpCode::Call(method) => self.call(position, method, CallKind::Direct)?,
            OpCode::Callvirt(method) => {
                if method.is_static() {
                    return Err(self.error(position, "静的メソッドに callvirt は使用できません"));
                }
                self.call(position, method, CallKind::Virtual)?;
            }
            OpCode::Ldnull => self.stack.push(Slot::Null),
            OpCode::Box(ty) => match self.pop(position)? {
                Slot::CallResult(result) if result == ty && ty.is_value_type() => {
                    self.stack.push(Slot::Object)
                }
                other => {
                    return Err(self.error(
                        position,
                        format!("{} の値型が必要です: {other:?}", ty.name()),
                    ))
                }
            },
            OpCode::Ret => return Err(self.error(position, "予期しない ret")),
        }
        Ok(())
    }

    fn call(&mut self, position: usize, method: &'static MethodInfo, kind: CallKind) -> InvokeResult<()> {
        if self.call.is_some() {
            return Err(self.error(position, "呼び出し命令は1つだけです"));
        }

        let mut arguments = Vec::with_capacity(method.parameters().len());
        for parameter in method.parameters().iter().rev() {
            match self.pop(position)? {
                Slot::Unboxed {
                    source: Source::Element(index),
                    ty,
                } if ty == parameter.ty => arguments.push(ArgumentLoad { index, ty }),
                other => {
                    return Err(self.error(
                        position,
                        format!("引数 {} には {} が必要です: {other:?}", parameter.name, parameter.ty.name()),
                    ))
                }
            }
        }
        arguments.reverse();

        let receiver = if method.is_static() {
            None
        } else {
            match self.pop(position)? {
                Slot::Unboxed {
                    source: Source::Receiver,
                    ty,
                } if ty == method.declaring_type() => Some(ty),
                other => {
                    return Err(self.error(
                        position,
                        format!("レシーバーには {} が必要です: {other:?}", method.declaring_type().name()),
                    ))
                }
            }
        };

        if let Some(ty) = method.return_type() {
            self.stack.push(Slot::CallResult(ty));
        }
        self.call = Some((method, kind, receiver, arguments));
        Ok(())
    }

    fn ret(&mut self, position: usize) -> InvokeResult<ResultKind> {
        let result = match self.pop(position)? {
            Slot::Null => ResultKind::Null,
            Slot::Object => ResultKind::Boxed,
            Slot::CallResult(ty) if !ty.is_value_type() => ResultKind::Reference,
            other => return Err(self.error(position, format!("戻り値がオブジェクトではありません: {other:?}"))),
        };
        if !self.stack.is_empty() {
            return Err(self.error(position, format!("ret 時にスタックが空ではありません ({})", self.stack.len())));
        }
        Ok(result)
    }
}

/// 命令列を検証して実行計画を返す
pub fn verify(name: &str, instructions: &[OpCode]) -> InvokeResult<Plan> {
    let mut verifier = Verifier {
        name,
        stack: Vec::new(),
        call: None,
    };

    for (position, op) in instructions.iter().copied().enumerate() {
        if let OpCode::Ret = op {
            if position + 1 != instructions.len() {
                return Err(verifier.error(position, "ret の後に命令があります"));
            }
            let result = verifier.ret(position)?;
            let (method, call, receiver, arguments) = verifier
                .call
                .take()
                .ok_or_else(|| verifier.error(position, "呼び出し命令がありません"))?;
            return Ok(Plan {
                receiver,
                arguments,
                method,
                call,
                result,
            });
        }
        verifier.step(position, op)?;
    }

    Err(InvokeError::invalid_program(name, "ret がありません"))
}
