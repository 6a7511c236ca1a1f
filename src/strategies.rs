//! 呼び出しストラテジーの登録
//!
//! 同じ対象メソッドへ到達する7通りの呼び出し方を、決まった順序で構築する。
//! 先頭の `Direct` がハーネスの基準になる。

use crate::core::{BenchError, BenchResult, InvokeError, InvokeResult};
use crate::dynamic::{CallSite, DynamicObject};
use crate::emit::{self, Trampoline};
use crate::expression::{Delegate, Expr, Lambda};
use crate::lazy::Deferred;
use crate::reflection::{MethodInfo, TypeInfo};
use crate::target::{BenchTarget, Foo};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// 引数なしの呼び出し可能オブジェクト
pub type Action = Box<dyn Fn() -> InvokeResult<()> + Send + Sync>;

/// 呼び出し方の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Direct,
    Dynamic,
    Reflection,
    Precompiled,
    LazyCompiled,
    IlEmitted,
    LazyIlEmitted,
}

impl StrategyKind {
    /// 計測順
    pub const ALL: [StrategyKind; 7] = [
        Self::Direct,
        Self::Dynamic,
        Self::Reflection,
        Self::Precompiled,
        Self::LazyCompiled,
        Self::IlEmitted,
        Self::LazyIlEmitted,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Direct => "Direct",
            Self::Dynamic => "Dynamic",
            Self::Reflection => "Reflection",
            Self::Precompiled => "Precompiled",
            Self::LazyCompiled => "LazyCompiled",
            Self::IlEmitted => "ILEmitted",
            Self::LazyIlEmitted => "LazyILEmitted",
        }
    }

    /// 初回呼び出しまで構築を遅延するか
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::LazyCompiled | Self::LazyIlEmitted)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 名前付きの呼び出し方
pub struct Strategy {
    name: String,
    action: Action,
    builds: Option<Arc<AtomicUsize>>,
}

impl Strategy {
    pub fn new<F>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn() -> InvokeResult<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            action: Box::new(action),
            builds: None,
        }
    }

    fn deferred(name: &str, action: Action, builds: Arc<AtomicUsize>) -> Self {
        Self {
            name: name.to_string(),
            action,
            builds: Some(builds),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 1回呼び出す
    #[inline]
    pub fn invoke(&self) -> InvokeResult<()> {
        (self.action)()
    }

    /// 遅延構築の実行回数（遅延しないストラテジーは `None`）
    pub fn build_count(&self) -> Option<usize> {
        self.builds
            .as_ref()
            .map(|builds| builds.load(Ordering::SeqCst))
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("name", &self.name)
            .field("build_count", &self.build_count())
            .finish_non_exhaustive()
    }
}

/// 順序付きのストラテジー一覧
#[derive(Debug)]
pub struct StrategyRegistry {
    strategies: Vec<Strategy>,
}

impl StrategyRegistry {
    /// `Foo::do_something` を対象にした標準構成
    pub fn standard() -> BenchResult<Self> {
        Self::for_target(Arc::new(Foo::new()))
    }

    /// 任意の対象に対して7つのストラテジーを構築
    ///
    /// `T::MEMBER` は引数なし・戻り値なしのメソッドであること
    pub fn for_target<T: BenchTarget>(target: Arc<T>) -> BenchResult<Self> {
        let type_info = TypeInfo::of::<T>();
        let method: &'static MethodInfo = type_info
            .get_method(T::MEMBER)
            .map_err(|e| BenchError::construction(StrategyKind::Reflection.name(), e))?;

        info!(
            target_type = type_info.name(),
            member = method.name(),
            "building invocation strategies"
        );

        let mut strategies = Vec::with_capacity(StrategyKind::ALL.len());
        for kind in StrategyKind::ALL {
            let strategy = build(kind, &target, method)
                .map_err(|e| BenchError::construction(kind.name(), e))?;
            debug!(strategy = kind.name(), deferred = kind.is_deferred(), "strategy ready");
            strategies.push(strategy);
        }

        Ok(Self { strategies })
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    pub fn get(&self, kind: StrategyKind) -> Option<&Strategy> {
        self.strategies.iter().find(|strategy| strategy.name() == kind.name())
    }
}

fn build<T: BenchTarget>(
    kind: StrategyKind,
    target: &Arc<T>,
    method: &'static MethodInfo,
) -> InvokeResult<Strategy> {
    let name = kind.name();
    let strategy = match kind {
        StrategyKind::Direct => {
            let target = Arc::clone(target);
            Strategy::new(name, move || {
                target.call_direct();
                Ok(())
            })
        }
        StrategyKind::Dynamic => {
            let object = DynamicObject::new(Arc::clone(target));
            let site = CallSite::new(method.name());
            Strategy::new(name, move || object.invoke_member(&site, &[]).map(drop))
        }
        StrategyKind::Reflection => {
            let target = Arc::clone(target);
            Strategy::new(name, move || {
                let receiver: &dyn Any = &*target;
                method.invoke(Some(receiver), &[]).map(drop)
            })
        }
        StrategyKind::Precompiled => {
            let delegate = compile_call(Arc::clone(target), method)?;
            Strategy::new(name, move || delegate().map(drop))
        }
        StrategyKind::LazyCompiled => {
            let target = Arc::clone(target);
            let builds = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&builds);
            let cell: Deferred<InvokeResult<Delegate>> = Deferred::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                debug!(strategy = name, "compiling deferred expression");
                compile_call(Arc::clone(&target), method)
            });
            let action: Action = Box::new(move || match cell.value() {
                Ok(delegate) => delegate().map(drop),
                Err(e) => Err(e.clone()),
            });
            Strategy::deferred(name, action, builds)
        }
        StrategyKind::IlEmitted => {
            let target = Arc::clone(target);
            let trampoline = emit::wrap(method)?;
            Strategy::new(name, move || call_trampoline(&trampoline, &*target))
        }
        StrategyKind::LazyIlEmitted => {
            let target = Arc::clone(target);
            let builds = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&builds);
            let cell: Deferred<InvokeResult<Trampoline>> = Deferred::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                debug!(strategy = name, "emitting deferred trampoline");
                emit::wrap(method)
            });
            let action: Action = Box::new(move || match cell.value() {
                Ok(trampoline) => call_trampoline(trampoline, &*target),
                Err(e) => Err(e.clone()),
            });
            Strategy::deferred(name, action, builds)
        }
    };
    Ok(strategy)
}

/// `() => target.Member()` を組み立ててコンパイル
fn compile_call<T: BenchTarget>(target: Arc<T>, method: &'static MethodInfo) -> InvokeResult<Delegate> {
    let body = Expr::call(Some(Expr::constant_of(target)), method, vec![])?;
    debug!(expression = %body, "compiling expression");
    Lambda::new(body).compile()
}

fn call_trampoline(trampoline: &Trampoline, target: &dyn Any) -> Result<(), InvokeError> {
    trampoline(Some(target), &[]).map(drop)
}
