use clap::Parser;
use clusterup::adapter::inbound::cli::command::Cli;
use clusterup::adapter::inbound::cli::diagnostic::CliDiagnostic;
use clusterup::adapter::inbound::cli::output::{self, OutputConfig};
use clusterup::adapter::inbound::cli;
use clusterup::error::Error;
use clusterup::infrastructure::config::settings::Settings;
use tracing::debug;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    output::configure(
        OutputConfig::new(cli.json, cli.quiet, cli.verbose),
        &cli.color,
    );

    let result = match Settings::load_or_default(&cli.settings) {
        Ok(settings) => {
            settings
                .logging
                .clone()
                .with_verbosity(cli.quiet, cli.verbose)
                .init();
            debug!(settings = %cli.settings.display(), "Settings loaded");
            cli::run(cli.command, &settings).await
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }
}

fn report(error: &Error) {
    if output::is_json() {
        output::error(&error.to_string());
    } else {
        eprintln!("{:?}", miette::Report::new(CliDiagnostic::from(error)));
    }
}
