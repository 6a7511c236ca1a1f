// ログ初期化
// 診断ログは標準エラーへ出し、標準出力は計測結果専用にする

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// `-v` の回数からログレベルを決める
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// グローバルなサブスクライバーを設定
///
/// 既に設定済みの場合はエラーを返す
pub fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let level = LevelFilter::from_level(level_for(verbosity));
    let filter = EnvFilter::default().add_directive(level.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init()?;

    Ok(())
}
