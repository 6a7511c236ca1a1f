// 遅延初期化セル
// 初回アクセス時に一度だけ値を構築し、以降は同じアクセス口から共有する

use std::fmt;
use std::sync::OnceLock;

/// 初回アクセス時に一度だけ構築される値
///
/// `OnceLock` を使うので、複数スレッドから同時にアクセスされても構築は1回
pub struct Deferred<T> {
    cell: OnceLock<T>,
    init: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T> Deferred<T> {
    pub fn new<F>(init: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            cell: OnceLock::new(),
            init: Box::new(init),
        }
    }

    /// 値を取得（未構築ならここで構築）
    pub fn value(&self) -> &T {
        self.cell.get_or_init(|| (self.init)())
    }
}

impl<T: fmt::Debug> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("Deferred").field(value).finish(),
            None => f.write_str("Deferred(<uninit>)"),
        }
    }
}
