//! 計測ハーネス
//!
//! ストラテジーごとに「1回の予備呼び出し → N回の計測ループ → 1行出力」を行う。
//! 先頭ストラテジーの経過時間を基準に、以降は倍率を付けて出力する。

use crate::core::{
    BenchConfig, BenchError, BenchResult, ResultReporter, Stopwatch, TimedResult,
};
use crate::strategies::Strategy;
use std::hint::black_box;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

/// 計測ハーネス
pub struct Harness<S: Stopwatch, R: ResultReporter> {
    iterations: usize,
    stopwatch: S,
    reporter: R,
}

impl<S: Stopwatch, R: ResultReporter> Harness<S, R> {
    /// 設定を検証してハーネスを作成
    pub fn new(config: &BenchConfig, stopwatch: S, reporter: R) -> BenchResult<Self> {
        config.validate()?;
        Ok(Self {
            iterations: config.iterations(),
            stopwatch,
            reporter,
        })
    }

    /// 全ストラテジーを順に計測して出力
    pub fn run(&mut self, strategies: &[Strategy]) -> BenchResult<()> {
        info!(
            iterations = self.iterations,
            strategies = strategies.len(),
            "benchmark started"
        );

        let mut baseline: Option<Duration> = None;
        for strategy in strategies {
            let elapsed = self.measure(strategy)?;
            let result = match baseline {
                None => {
                    baseline = Some(elapsed);
                    TimedResult::baseline(strategy.name(), elapsed)
                }
                Some(base) => TimedResult::relative(strategy.name(), elapsed, base),
            };
            debug!(strategy = strategy.name(), ?elapsed, "measured");
            self.reporter.report(&result)?;
        }

        info!("benchmark finished");
        Ok(())
    }

    fn measure(&mut self, strategy: &Strategy) -> BenchResult<Duration> {
        // 予備呼び出し（遅延構築はここで走る）
        strategy
            .invoke()
            .map_err(|e| BenchError::invocation(strategy.name(), e))?;

        self.stopwatch.restart();
        for _ in 0..self.iterations {
            black_box(strategy.invoke()).map_err(|e| BenchError::invocation(strategy.name(), e))?;
        }
        Ok(self.stopwatch.stop())
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }
}

/// 結果行をそのまま書き出すレポーター
#[derive(Debug)]
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultReporter for ConsoleReporter<W> {
    fn report(&mut self, result: &TimedResult) -> BenchResult<()> {
        writeln!(self.out, "{result}")?;
        self.out.flush()?;
        Ok(())
    }
}
