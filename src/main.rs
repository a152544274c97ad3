use clap::Parser;
use sigtrader::cli::{Cli, run};
use sigtrader::logging::init_logging;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}
