// ベンチマーク設定
// ループ回数は固定定数だが、テスト用に小さい値へ差し替えられるようにしておく

use super::error::ValidationError;

/// 既定のループ回数
pub const DEFAULT_ITERATIONS: usize = 1_000_000;

/// ベンチマーク実行設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    iterations: usize,
    pause_on_exit: bool,
}

impl BenchConfig {
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            pause_on_exit: false,
        }
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_pause_on_exit(mut self, pause: bool) -> Self {
        self.pause_on_exit = pause;
        self
    }

    /// 計測ループの回数
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// 終了前にキー入力を待つかどうか
    pub fn pause_on_exit(&self) -> bool {
        self.pause_on_exit
    }

    /// 設定をバリデーション
    ///
    /// ループ回数0では基準時間が0になり比率が定義できないため拒否する
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.iterations == 0 {
            return Err(ValidationError::new(
                "iterations",
                "ループ回数は1以上である必要があります",
            ));
        }
        Ok(())
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bench_config() {
        let config = BenchConfig::default();

        assert_eq!(config.iterations(), 1_000_000);
        assert!(!config.pause_on_exit());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bench_config_builder() {
        let config = BenchConfig::default()
            .with_iterations(1000)
            .with_pause_on_exit(true);

        assert_eq!(config.iterations(), 1000);
        assert!(config.pause_on_exit());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let error = BenchConfig::new(0).validate().unwrap_err();
        assert_eq!(error.field, "iterations");
    }
}
