// 命令セット
// トランポリン生成に必要な最小限の IL 風命令

use crate::reflection::{MethodInfo, TypeDesc};
use std::fmt;

/// スタックマシン命令
#[derive(Debug, Clone, Copy)]
pub enum OpCode {
    /// 第1引数（レシーバー）を積む
    Ldarg0,
    /// 第2引数（引数配列）を積む
    Ldarg1,
    /// 整数定数を積む
    LdcI4(i32),
    /// 配列と添字を降ろし、要素（ボックス化された値）を積む
    LdelemRef,
    /// ボックス化された値を指定型として取り出す
    UnboxAny(TypeDesc),
    /// 静的に決まる呼び出し
    Call(&'static MethodInfo),
    /// レシーバーの null 検査付き呼び出し
    Callvirt(&'static MethodInfo),
    /// null を積む
    Ldnull,
    /// 値型の戻り値をボックス化
    Box(TypeDesc),
    Ret,
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ldarg0 => f.write_str("ldarg.0"),
            Self::Ldarg1 => f.write_str("ldarg.1"),
            Self::LdcI4(value) => write!(f, "ldc.i4 {value}"),
            Self::LdelemRef => f.write_str("ldelem.ref"),
            Self::UnboxAny(ty) => write!(f, "unbox.any {}", ty.name()),
            Self::Call(method) => write!(
                f,
                "call {}::{}",
                method.declaring_type().name(),
                method.name()
            ),
            Self::Callvirt(method) => write!(
                f,
                "callvirt {}::{}",
                method.declaring_type().name(),
                method.name()
            ),
            Self::Ldnull => f.write_str("ldnull"),
            Self::Box(ty) => write!(f, "box {}", ty.name()),
            Self::Ret => f.write_str("ret"),
        }
    }
}

/// 命令列の組み立て
#[derive(Debug, Default, Clone)]
pub struct IlGenerator {
    instructions: Vec<OpCode>,
}

impl IlGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, op: OpCode) -> &mut Self {
        self.instructions.push(op);
        self
    }

    pub fn instructions(&self) -> &[OpCode] {
        &self.instructions
    }
}
