use ddbcli::{Error, cli, commands, config, logging, output, report};

use clap::Parser;
use std::{env, io, process::ExitCode};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = cli::inject_table(env::args_os().collect(), env::var_os(cli::TABLE_ENV));
    let cli = cli::Cli::parse_from(args);
    logging::init(cli.log_level);
    let verbose = cli.log_level.is_verbose();
    let result = commands::run(cli)
        .await
        .and_then(|result| output::render(result).map_err(Error::from));
    match result {
        Ok(Some(rendered)) => {
            println!("{rendered}");
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(err) => {
            let error_log = config::config_dir()
                .ok()
                .map(|dir| logging::ErrorLog::new(&dir));
            let status = report::report(&err, verbose, error_log.as_ref(), &mut io::stderr());
            ExitCode::from(status)
        }
    }
}
