use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use conductor::{
    app::App,
    cli::{Cli, Cmd},
    commands,
    config::{self, Config},
    errors, logging,
    store::Store,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    errors::init()?;
    config::ensure_data_and_config_dirs_exist()?;
    let _guard = logging::init()?;
    let config = Config::new()?;

    let store = if config.store.demo_data {
        Store::with_demo_data(config.store_latency())
    } else {
        Store::new(config.store_latency())
    };

    match cli.cmd.unwrap_or(Cmd::Run { screen: None }) {
        Cmd::Run { screen } => {
            let screen = screen.unwrap_or(config.ui.start_screen);
            info!(%screen, "starting console");
            let mut app = App::new(config, Arc::new(store), screen);
            app.run().await?;
            Ok(ExitCode::SUCCESS)
        }
        Cmd::Describe { screen, record } => {
            let record = record.as_deref().map(commands::read_record).transpose()?;
            let dir = store.snapshot().await;
            println!("{}", commands::describe(screen, record.as_ref(), &dir)?);
            Ok(ExitCode::SUCCESS)
        }
        Cmd::Check { screen, record } => {
            let value = commands::read_record(&record)?;
            let dir = store.snapshot().await;
            let report = commands::check(screen, &value, &dir, config.form_options())?;
            if report.is_valid() {
                println!("{}: ok", record.display());
                return Ok(ExitCode::SUCCESS);
            }
            for problem in &report.errors {
                println!("{}: {}: {}", record.display(), problem.field, problem.message);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
