// テストユーティリティ
// 呼び出し回数を数える計測対象と、出力行の検査ヘルパー

#![allow(dead_code)]

use invocation_bench::reflection::{MethodInfo, Reflect, TypeDesc, TypeInfo};
use invocation_bench::target::BenchTarget;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

pub const TOUCH: &str = "Touch";

/// 呼び出し回数を記録する計測対象
#[derive(Debug, Default)]
pub struct CountingTarget {
    calls: AtomicUsize,
}

impl CountingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Reflect for CountingTarget {
    fn type_info() -> &'static TypeInfo {
        static INFO: OnceLock<TypeInfo> = OnceLock::new();
        INFO.get_or_init(|| {
            let desc = TypeDesc::reference::<CountingTarget>("CountingTarget");
            TypeInfo::new(
                desc,
                vec![MethodInfo::instance::<CountingTarget, _>(
                    TOUCH,
                    desc,
                    vec![],
                    None,
                    |this, _| {
                        this.touch();
                        Ok(None)
                    },
                )],
            )
        })
    }
}

impl BenchTarget for CountingTarget {
    const MEMBER: &'static str = TOUCH;

    fn call_direct(&self) {
        self.touch();
    }
}

/// 解析済みの出力行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub name: String,
    /// 基準行は `None`
    pub ratio: Option<String>,
    pub elapsed: String,
}

/// `<name> : <span>` または `<name> (-<ratio>x) : <span>` を解析
pub fn parse_line(line: &str) -> Option<Line> {
    let (head, elapsed) = line.split_once(" : ")?;
    if !is_time_span(elapsed) {
        return None;
    }
    let (name, ratio) = match head.split_once(" (-") {
        Some((name, rest)) => {
            let ratio = rest.strip_suffix("x)")?;
            if !is_ratio(ratio) {
                return None;
            }
            (name, Some(ratio.to_string()))
        }
        None => (head, None),
    };
    if name.is_empty() || name.contains(' ') {
        return None;
    }
    Some(Line {
        name: name.to_string(),
        ratio,
        elapsed: elapsed.to_string(),
    })
}

/// 小数3桁の比率、または `inf`
fn is_ratio(text: &str) -> bool {
    if text == "inf" {
        return true;
    }
    match text.split_once('.') {
        Some((int, frac)) => {
            !int.is_empty()
                && int.bytes().all(|b| b.is_ascii_digit())
                && frac.len() == 3
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// `[d:]h:mm:ss[.fffffff]`
fn is_time_span(text: &str) -> bool {
    let (clock, fraction) = match text.split_once('.') {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (text, None),
    };
    if let Some(fraction) = fraction {
        let valid = (1..=7).contains(&fraction.len())
            && fraction.bytes().all(|b| b.is_ascii_digit())
            && !fraction.ends_with('0');
        if !valid {
            return false;
        }
    }

    let parts: Vec<&str> = clock.split(':').collect();
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    match parts.as_slice() {
        [h, m, s] => digits(h) && m.len() == 2 && digits(m) && s.len() == 2 && digits(s),
        [d, h, m, s] => {
            digits(d) && digits(h) && m.len() == 2 && digits(m) && s.len() == 2 && digits(s)
        }
        _ => false,
    }
}
