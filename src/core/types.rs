// ハーネスが扱う計測結果の型定義

use std::fmt;
use std::time::Duration;

/// .NET の TimeSpan と同じ 100ns 単位
const NANOS_PER_TICK: u128 = 100;
const TICKS_PER_SECOND: u128 = 10_000_000;

/// 基準ストラテジーに対する比率
///
/// 10進演算で計算し、小数3桁に四捨五入（0から遠い方へ）して表示する
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    elapsed_nanos: u128,
    baseline_nanos: u128,
}

impl Ratio {
    pub fn new(elapsed: Duration, baseline: Duration) -> Self {
        Self::from_nanos(elapsed.as_nanos(), baseline.as_nanos())
    }

    pub fn from_nanos(elapsed_nanos: u128, baseline_nanos: u128) -> Self {
        Self {
            elapsed_nanos,
            baseline_nanos,
        }
    }

    /// 比率を1000倍した整数値（四捨五入済み）
    ///
    /// 基準が0の場合は定義できないので `None`
    pub fn thousandths(&self) -> Option<u128> {
        if self.baseline_nanos == 0 {
            return None;
        }
        let scaled = self.elapsed_nanos.checked_mul(2000)?;
        Some((scaled + self.baseline_nanos) / (2 * self.baseline_nanos))
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.thousandths() {
            Some(value) => write!(f, "{}.{:03}", value / 1000, value % 1000),
            None if self.elapsed_nanos == 0 => f.write_str("1.000"),
            None => f.write_str("inf"),
        }
    }
}

/// 1ストラテジー分の計測結果
///
/// 計算後すぐにレポーターへ渡され、ハーネスには保持されない
#[derive(Debug, Clone, PartialEq)]
pub struct TimedResult {
    pub name: String,
    pub elapsed: Duration,
    /// 基準ストラテジー自身は `None`
    pub ratio: Option<Ratio>,
}

impl TimedResult {
    pub fn baseline(name: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            name: name.into(),
            elapsed,
            ratio: None,
        }
    }

    pub fn relative(name: impl Into<String>, elapsed: Duration, baseline: Duration) -> Self {
        Self {
            name: name.into(),
            elapsed,
            ratio: Some(Ratio::new(elapsed, baseline)),
        }
    }
}

impl fmt::Display for TimedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elapsed = TimeSpan(self.elapsed);
        match &self.ratio {
            None => write!(f, "{} : {elapsed}", self.name),
            Some(ratio) => write!(f, "{} (-{ratio}x) : {elapsed}", self.name),
        }
    }
}

/// 経過時間の汎用短縮表示 `[d:]h:mm:ss[.fffffff]`
///
/// 小数部は100ns単位で、末尾の0は省略する
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan(pub Duration);

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ticks = self.0.as_nanos() / NANOS_PER_TICK;
        let fraction = ticks % TICKS_PER_SECOND;
        let total_seconds = ticks / TICKS_PER_SECOND;

        let seconds = total_seconds % 60;
        let minutes = (total_seconds / 60) % 60;
        let hours = (total_seconds / 3600) % 24;
        let days = total_seconds / 86_400;

        if days > 0 {
            write!(f, "{days}:")?;
        }
        write!(f, "{hours}:{minutes:02}:{seconds:02}")?;

        if fraction > 0 {
            let digits = format!("{fraction:07}");
            write!(f, ".{}", digits.trim_end_matches('0'))?;
        }
        Ok(())
    }
}
