use atomfix_core::cli::{self, Cli, Session};
use atomfix_core::exit::AtomfixExit;
use clap::Parser;
use colored::Colorize;

fn main() -> AtomfixExit {
    let cli = Cli::parse();

    let Some(cmd) = cli.command else {
        use clap::CommandFactory;
        let _ = Cli::command().print_help();
        return AtomfixExit::Success;
    };

    let result = Session::open(cli.root, cli.config, cli.json)
        .and_then(|session| cli::dispatch::execute(&session, cmd));

    match result {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red());
            AtomfixExit::Error
        }
    }
}
