mod allocation;
mod api;
mod cli;
mod error;
mod fmt;
mod lifecycle;
mod models;
mod settings;
mod tui;
mod workspace;

use clap::Parser;
use colored::Colorize;

use crate::api::HttpApi;
use crate::cli::{parse_date_opt, Cli, Commands};
use crate::error::Result;
use crate::models::FilterCriteria;
use crate::settings::load_settings;

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {e}", "error:".red());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Init {
        server,
        api_key,
        enforce_split_totals,
    } = &cli.command
    {
        return cli::init::run(server, api_key.as_deref(), *enforce_split_totals);
    }

    let api = HttpApi::from_settings(&load_settings())?;

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::List {
            batch,
            card_member,
            from_date,
            to_date,
            keyword,
        } => {
            let filters = FilterCriteria {
                batch_id: batch,
                card_member,
                from_date: parse_date_opt(&from_date)?,
                to_date: parse_date_opt(&to_date)?,
                keyword,
            };
            cli::list::run(&api, &filters)
        }
        Commands::Show { transaction } => cli::show::run(&api, &transaction),
        Commands::Review => cli::review::run(&api),
        Commands::Approve { transaction } => cli::actions::approve(&api, &transaction),
        Commands::Post { transaction } => cli::actions::post(&api, &transaction),
        Commands::Duplicate { transaction } => cli::actions::duplicate(&api, &transaction),
    }
}
