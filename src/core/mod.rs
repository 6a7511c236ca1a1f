// コアレイヤー - 基盤となるトレイト、型、エラー、設定
// 他のレイヤーから参照される基本的な抽象化を提供

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

// 公開API - 明示的にエクスポートして曖昧性を回避
pub use config::{BenchConfig, DEFAULT_ITERATIONS};
pub use error::{
    BenchError, BenchResult, ErrorSeverity, InvokeError, InvokeResult, ValidationError,
};
pub use traits::{ResultReporter, Stopwatch, SystemStopwatch};
pub use types::{Ratio, TimeSpan, TimedResult};
