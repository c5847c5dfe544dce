use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use devlog::{Cli, EnvConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = EnvConfig::from_env();
    devlog::logging::init(config.log_filter());

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            devlog::run(cli, &config, &cwd, &mut out)?;
            out.flush()?;
            Ok(())
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("devlog: {error:#}");
            if let Some(hint) = devlog::hint(&error) {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(devlog::exit_code(&error))
        }
    }
}
