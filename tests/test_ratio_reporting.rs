// 比率出力テスト
// モックのストップウォッチで経過時間を固定し、基準に対する比率の書式を確認する

use invocation_bench::core::traits::MockStopwatch;
use invocation_bench::{BenchConfig, ConsoleReporter, Harness, Strategy, TimedResult};
use std::time::Duration;

fn stopwatch_returning(durations: Vec<Duration>) -> MockStopwatch {
    let count = durations.len();
    let mut durations = durations.into_iter();
    let mut stopwatch = MockStopwatch::new();
    stopwatch.expect_restart().times(count).return_const(());
    stopwatch
        .expect_stop()
        .times(count)
        .returning(move || durations.next().unwrap_or_default());
    stopwatch
}

fn noop(name: &str) -> Strategy {
    Strategy::new(name, || Ok(()))
}

#[test]
fn test_ratio_against_baseline() {
    let stopwatch = stopwatch_returning(vec![
        Duration::from_nanos(1_000_000),
        Duration::from_nanos(5_500_000),
    ]);
    let config = BenchConfig::default().with_iterations(3);
    let mut harness = Harness::new(&config, stopwatch, ConsoleReporter::new(Vec::new())).unwrap();

    harness.run(&[noop("Direct"), noop("Reflection")]).unwrap();

    let output = String::from_utf8(harness.into_reporter().into_inner()).unwrap();
    assert_eq!(
        output,
        "Direct : 0:00:00.001\nReflection (-5.500x) : 0:00:00.0055\n"
    );
}

#[test]
fn test_zero_baseline() {
    let stopwatch = stopwatch_returning(vec![Duration::ZERO, Duration::from_nanos(300), Duration::ZERO]);
    let config = BenchConfig::default().with_iterations(1);
    let mut harness = Harness::new(&config, stopwatch, ConsoleReporter::new(Vec::new())).unwrap();

    harness.run(&[noop("Direct"), noop("Dynamic"), noop("Reflection")]).unwrap();

    let output = String::from_utf8(harness.into_reporter().into_inner()).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Direct : 0:00:00",
            "Dynamic (-infx) : 0:00:00.0000003",
            "Reflection (-1.000x) : 0:00:00",
        ]
    );
}

#[test]
fn test_result_line_formats() {
    let baseline = TimedResult::baseline("Direct", Duration::from_secs(1));
    let relative = TimedResult::relative("Precompiled", Duration::from_nanos(1_234_567_891), Duration::from_secs(1));

    assert_eq!(baseline.to_string(), "Direct : 0:00:01");
    assert_eq!(relative.to_string(), "Precompiled (-1.235x) : 0:00:01.2345678");
}
