//! The export pipeline, from credentials to the final summary.

use crate::cli::Cli;
use crate::credentials::{Prompter, TerminalPrompter, resolve_credentials};
use crate::export::{
    ExportOptions, ExportSummary, export_activities, prepare_output_dir, write_summary,
};
use crate::listing::fetch_all_activities;
use crate::selection::{distinct_categories, filter_activities, prompt_category_selection};
use crate::ExportResult;
use garmin_connect_client::config::ClientConfig;
use garmin_connect_client::http_client::ReqwestGarminClient;
use std::io::{self, BufRead, Write};

/// Run against the real Garmin services and the terminal.
pub async fn run(cli: Cli) -> ExportResult<ExportSummary> {
    let config = ClientConfig::from_env()?;
    // Unlocked reader: the credential prompt reads stdin too.
    let mut input = io::BufReader::new(io::stdin());
    run_with(cli, &config, &mut TerminalPrompter, &mut input, &mut io::stdout()).await
}

/// Run the whole export with injectable endpoints and terminal streams.
///
/// Returns an error only for fatal failures: credentials, sign-in, listing,
/// the output directory or the selection prompt. Download failures are
/// reported in the returned summary.
pub async fn run_with<R, W>(
    cli: Cli,
    config: &ClientConfig,
    prompter: &mut dyn Prompter,
    input: &mut R,
    out: &mut W,
) -> ExportResult<ExportSummary>
where
    R: BufRead,
    W: Write,
{
    let output_dir = prepare_output_dir(&cli.output).await?;
    tracing::info!(output = %output_dir.display(), "writing FIT files");

    let credentials = resolve_credentials(cli.username, cli.password, prompter)?;
    let client = ReqwestGarminClient::login(config, &credentials).await?;

    let activities = fetch_all_activities(&client, cli.batch_size, cli.max_activities).await?;
    if activities.is_empty() {
        writeln!(out, "No activities returned by Garmin Connect.")?;
        return Ok(ExportSummary::default());
    }

    let categories = distinct_categories(&activities);
    let selection = prompt_category_selection(&categories, input, out)?;
    let selected = filter_activities(&activities, &selection);
    tracing::info!(
        listed = activities.len(),
        selected = selected.len(),
        "applied category filter"
    );
    if selected.is_empty() {
        writeln!(out, "No activities matched the selected type filters.")?;
        return Ok(ExportSummary::default());
    }

    let options = ExportOptions {
        output_dir: output_dir.clone(),
        skip_existing: cli.skip_existing,
    };
    let summary = export_activities(&client, &selected, &options, out).await?;
    write_summary(&summary, &output_dir, out)?;
    if summary.has_failures() {
        tracing::warn!(failed = summary.failed.len(), "some activities could not be exported");
    }
    Ok(summary)
}
