// CLI層 - コマンドライン引数の定義と処理

pub mod args;
pub mod commands;

pub use args::Cli;
pub use commands::{config_from, run_benchmark, wait_for_enter};
