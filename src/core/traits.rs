// ハーネスのトレイト定義
// 時間計測と結果出力を抽象化し、テストで差し替えられるようにする

use super::error::BenchResult;
use super::types::TimedResult;
use mockall::automock;
use std::time::{Duration, Instant};

/// 単調増加する経過時間計測の抽象化トレイト
#[automock]
pub trait Stopwatch {
    /// 計測をリセットして開始
    fn restart(&mut self);

    /// 計測を停止して経過時間を取得
    fn stop(&mut self) -> Duration;
}

/// 計測結果の出力を抽象化するトレイト
#[automock]
pub trait ResultReporter {
    /// 1ストラテジー分の結果を出力
    fn report(&mut self, result: &TimedResult) -> BenchResult<()>;
}

/// `Instant` による標準のストップウォッチ
#[derive(Debug, Default, Clone)]
pub struct SystemStopwatch {
    started: Option<Instant>,
}

impl SystemStopwatch {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Stopwatch for SystemStopwatch {
    fn restart(&mut self) {
        self.started = Some(Instant::now());
    }

    fn stop(&mut self) -> Duration {
        self.started
            .take()
            .map(|started| started.elapsed())
            .unwrap_or(Duration::ZERO)
    }
}
