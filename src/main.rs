use anyhow::Result;
use clap::Parser;
use invocation_bench::cli::{self, Cli};
use invocation_bench::logging::init_logging;
use invocation_bench::BenchError;
use tracing::error;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = cli::config_from(&cli);
    if let Err(e) = cli::run_benchmark(&config) {
        if let Some(bench_error) = e.downcast_ref::<BenchError>() {
            error!(severity = bench_error.severity().as_str(), "{bench_error}");
        }
        return Err(e);
    }
    Ok(())
}
