// ベンチマーク用のカスタムエラー型定義
// 呼び出し経路のエラーと、ハーネス全体のエラーを分けて管理

use thiserror::Error;

/// メソッド呼び出し（リフレクション・式木・コード生成）で発生するエラー
///
/// 遅延構築されたストラテジーが失敗をキャッシュして毎回返せるよう、
/// `Clone` を実装している
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    #[error("メンバーが見つかりません: {type_name}::{member}")]
    MemberNotFound {
        type_name: &'static str,
        member: String,
    },

    #[error("レシーバーがありません: {method}")]
    NullReceiver { method: &'static str },

    #[error("型変換エラー: {expected} を期待しました")]
    InvalidCast { expected: &'static str },

    #[error("引数の数が一致しません: {method} (期待: {expected}, 実際: {actual})")]
    ArgumentCount {
        method: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("引数インデックスが範囲外です: {index} (長さ: {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("不正なプログラム: {method} - {reason}")]
    InvalidProgram { method: String, reason: String },

    #[error("不正な式: {reason}")]
    InvalidExpression { reason: String },
}

impl InvokeError {
    /// メンバー未検出エラーの作成
    pub fn member_not_found(type_name: &'static str, member: impl Into<String>) -> Self {
        Self::MemberNotFound {
            type_name,
            member: member.into(),
        }
    }

    /// 不正プログラムエラーの作成
    pub fn invalid_program(method: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidProgram {
            method: method.into(),
            reason: reason.into(),
        }
    }

    /// 不正な式エラーの作成
    pub fn invalid_expression(reason: impl Into<String>) -> Self {
        Self::InvalidExpression {
            reason: reason.into(),
        }
    }
}

/// ベンチマークハーネス全体のエラー型
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("ストラテジー構築エラー: {strategy} - {source}")]
    Construction {
        strategy: &'static str,
        #[source]
        source: InvokeError,
    },

    #[error("呼び出しエラー: {strategy} - {source}")]
    Invocation {
        strategy: String,
        #[source]
        source: InvokeError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("出力エラー: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl BenchError {
    /// 構築エラーの作成
    pub fn construction(strategy: &'static str, source: InvokeError) -> Self {
        Self::Construction { strategy, source }
    }

    /// 呼び出しエラーの作成
    pub fn invocation(strategy: impl Into<String>, source: InvokeError) -> Self {
        Self::Invocation {
            strategy: strategy.into(),
            source,
        }
    }

    /// エラーの重要度を取得
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Construction { .. } | Self::Validation(_) => ErrorSeverity::Critical,
            Self::Invocation { .. } => ErrorSeverity::High,
            Self::Io { .. } => ErrorSeverity::Medium,
        }
    }
}

/// エラーの重要度レベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// 中重要度 - 出力のみ失敗
    Medium,
    /// 高重要度 - 計測結果が得られない
    High,
    /// 致命的 - 計測開始前に停止
    Critical,
}

impl ErrorSeverity {
    /// 重要度の文字列表現を取得
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

/// バリデーション専用エラー型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("バリデーションエラー: {field} - {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    /// 新しいバリデーションエラーを作成
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 呼び出し経路の結果型
pub type InvokeResult<T> = std::result::Result<T, InvokeError>;

/// ハーネスの結果型
pub type BenchResult<T> = std::result::Result<T, BenchError>;
