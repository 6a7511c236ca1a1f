// コマンド実行
// 構築・計測・出力をつなぎ、終了時の待機を扱う

use super::args::Cli;
use crate::core::{BenchConfig, SystemStopwatch};
use crate::harness::{ConsoleReporter, Harness};
use crate::strategies::StrategyRegistry;
use anyhow::{Context, Result};
use std::io::BufRead;
use tracing::info;

/// CLI 引数から実行設定を作る
pub fn config_from(cli: &Cli) -> BenchConfig {
    BenchConfig::default().with_pause_on_exit(cli.pause)
}

/// 標準構成で計測し、結果を標準出力へ書く
pub fn run_benchmark(config: &BenchConfig) -> Result<()> {
    let mut harness = Harness::new(config, SystemStopwatch::new(), ConsoleReporter::stdout())?;
    let registry = StrategyRegistry::standard().context("ストラテジーの構築に失敗しました")?;
    harness.run(registry.strategies())?;

    if config.pause_on_exit() {
        wait_for_enter(std::io::stdin().lock())?;
    }
    Ok(())
}

/// 1行読むまで待つ（EOF でも戻る）
pub fn wait_for_enter<R: BufRead>(mut input: R) -> Result<()> {
    info!("waiting for Enter");
    let mut line = String::new();
    input.read_line(&mut line).context("標準入力の読み取りに失敗しました")?;
    Ok(())
}
