//! 呼び出し方式ごとのメソッド呼び出しコストを比較するマイクロベンチマーク
//!
//! 何もしないメソッド `Foo::do_something` に対して、直接呼び出し・動的ディスパッチ・
//! リフレクション・事前コンパイル式木・実行時コード生成などの7方式で到達し、
//! 先頭の直接呼び出しを基準にした相対コストを出力する。

pub mod cli;
pub mod core;
pub mod dynamic;
pub mod emit;
pub mod expression;
pub mod harness;
pub mod lazy;
pub mod logging;
pub mod reflection;
pub mod strategies;
pub mod target;

pub use crate::core::{BenchConfig, BenchError, BenchResult, InvokeError, InvokeResult, TimedResult};
pub use harness::{ConsoleReporter, Harness};
pub use strategies::{Strategy, StrategyKind, StrategyRegistry};
pub use target::{BenchTarget, Foo, TARGET_METHOD};
