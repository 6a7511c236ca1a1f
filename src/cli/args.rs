use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "invocation_bench")]
#[command(about = "Compares the cost of calling one no-op method through seven invocation strategies")]
#[command(version)]
pub struct Cli {
    /// Wait for Enter before exiting
    #[arg(long)]
    pub pause: bool,

    /// Increase diagnostic output on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["invocation_bench"]).unwrap();
        assert!(!cli.pause);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from(["invocation_bench", "--pause", "-vv"]).unwrap();
        assert!(cli.pause);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_rejects_measurement_options() {
        assert!(Cli::try_parse_from(["invocation_bench", "--iterations", "10"]).is_err());
    }
}
