use clap::Parser;
use garmin_fit_exporter::{app, cli::Cli, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    match app::run(cli).await {
        Ok(_summary) => Ok(()),
        Err(e) => {
            eprintln!("{}", e.user_message());
            Err(anyhow::Error::new(e).context("export aborted"))
        }
    }
}
