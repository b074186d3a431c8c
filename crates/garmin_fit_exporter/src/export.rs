//! Download-and-write loop.

use crate::naming::destination_path;
use crate::{ExportError, ExportResult};
use garmin_connect_client::{ActivitySummary, GarminClient};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    pub skip_existing: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedExport {
    pub activity_id: u64,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub written: Vec<PathBuf>,
    pub skipped: usize,
    pub failed: Vec<FailedExport>,
}

impl ExportSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Create the output directory (and parents) and return its absolute path.
pub async fn prepare_output_dir(dir: &Path) -> ExportResult<PathBuf> {
    let output_dir = |source| ExportError::OutputDir {
        path: dir.to_path_buf(),
        source,
    };
    tokio::fs::create_dir_all(dir).await.map_err(output_dir)?;
    std::path::absolute(dir).map_err(output_dir)
}

/// Download every activity and write it under `options.output_dir`.
///
/// A failing activity is reported and recorded in the summary; the loop then
/// moves on to the next one. Progress lines go to `out`; failing to write
/// them is the only error returned.
pub async fn export_activities<W: Write>(
    client: &dyn GarminClient,
    activities: &[&ActivitySummary],
    options: &ExportOptions,
    out: &mut W,
) -> std::io::Result<ExportSummary> {
    let mut summary = ExportSummary::default();

    for activity in activities {
        let Some(activity_id) = activity.activity_id else {
            tracing::warn!(
                activity_name = activity.activity_name.as_deref().unwrap_or_default(),
                "skipping activity without an ID"
            );
            summary.skipped += 1;
            continue;
        };

        let destination = destination_path(
            &options.output_dir,
            activity_id,
            activity.activity_name.as_deref(),
        );
        if options.skip_existing && tokio::fs::try_exists(&destination).await.unwrap_or(false) {
            writeln!(out, "Skipping existing file {}", destination.display())?;
            summary.skipped += 1;
            continue;
        }

        match export_one(client, activity_id, &destination).await {
            Ok(size) => {
                tracing::debug!(activity_id, size, "wrote activity");
                writeln!(out, "Wrote {}", destination.display())?;
                summary.written.push(destination);
            }
            Err(error) => {
                tracing::error!(activity_id, %error, "failed to export activity");
                writeln!(out, "Failed to export activity {activity_id}: {error}")?;
                summary.failed.push(FailedExport {
                    activity_id,
                    error: error.to_string(),
                });
            }
        }
    }

    Ok(summary)
}

async fn export_one(
    client: &dyn GarminClient,
    activity_id: u64,
    destination: &Path,
) -> ExportResult<usize> {
    let bytes = client.download_activity_fit(activity_id).await?;
    tokio::fs::write(destination, &bytes).await?;
    Ok(bytes.len())
}

/// Print the end-of-run summary.
pub fn write_summary<W: Write>(
    summary: &ExportSummary,
    output_dir: &Path,
    out: &mut W,
) -> std::io::Result<()> {
    writeln!(
        out,
        "\nExported {} activities to {}",
        summary.written.len(),
        output_dir.display()
    )?;
    if summary.skipped > 0 {
        writeln!(out, "Skipped {} activities", summary.skipped)?;
    }
    if summary.has_failures() {
        writeln!(out, "Failed to export {} activities:", summary.failed.len())?;
        for failure in &summary.failed {
            writeln!(out, "  {}: {}", failure.activity_id, failure.error)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeClient, activity};
    use garmin_connect_client::GarminError;

    fn options(dir: &Path) -> ExportOptions {
        ExportOptions {
            output_dir: dir.to_path_buf(),
            skip_existing: false,
        }
    }

    #[tokio::test]
    async fn writes_each_activity() {
        let dir = tempfile::tempdir().unwrap();
        let acts = vec![
            activity(1, "Morning Run", Some("running")),
            activity(2, "Ride", Some("cycling")),
        ];
        let client = FakeClient::new(acts.clone());
        let refs: Vec<&ActivitySummary> = acts.iter().collect();
        let mut out: Vec<u8> = Vec::new();

        let summary = export_activities(&client, &refs, &options(dir.path()), &mut out)
            .await
            .unwrap();

        assert_eq!(summary.written.len(), 2);
        assert!(!summary.has_failures());
        let run = std::fs::read(dir.path().join("1_Morning Run.fit")).unwrap();
        assert_eq!(run, FakeClient::payload_for(1));
        assert!(dir.path().join("2_Ride.fit").exists());
        assert!(String::from_utf8(out).unwrap().contains("Wrote "));
    }

    #[tokio::test]
    async fn download_failure_does_not_stop_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let acts = vec![
            activity(2, "Ride", Some("cycling")),
            activity(1, "Morning Run", Some("running")),
        ];
        let client = FakeClient::new(acts.clone())
            .fail_download(2, GarminError::NotFound("gone".into()));
        let refs: Vec<&ActivitySummary> = acts.iter().collect();
        let mut out: Vec<u8> = Vec::new();

        let summary = export_activities(&client, &refs, &options(dir.path()), &mut out)
            .await
            .unwrap();

        assert_eq!(summary.written, vec![dir.path().join("1_Morning Run.fit")]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].activity_id, 2);
        assert!(!dir.path().join("2_Ride.fit").exists());
    }

    #[tokio::test]
    async fn write_failure_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let acts = vec![activity(5, "Swim", Some("swimming"))];
        let client = FakeClient::new(acts.clone());
        let refs: Vec<&ActivitySummary> = acts.iter().collect();

        let mut out: Vec<u8> = Vec::new();
        let summary = export_activities(&client, &refs, &options(&missing), &mut out)
            .await
            .unwrap();

        assert!(summary.written.is_empty());
        assert_eq!(summary.failed.len(), 1);
        assert!(summary.failed[0].error.contains("I/O error"));
    }

    #[tokio::test]
    async fn skip_existing_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("1_Morning Run.fit");
        std::fs::write(&existing, b"old").unwrap();
        let acts = vec![activity(1, "Morning Run", Some("running"))];
        let client = FakeClient::new(acts.clone());
        let refs: Vec<&ActivitySummary> = acts.iter().collect();
        let opts = ExportOptions {
            output_dir: dir.path().to_path_buf(),
            skip_existing: true,
        };

        let summary = export_activities(&client, &refs, &opts, &mut Vec::<u8>::new())
            .await
            .unwrap();

        assert_eq!(summary.skipped, 1);
        assert!(summary.written.is_empty());
        assert_eq!(std::fs::read(&existing).unwrap(), b"old");
        assert!(client.downloads().is_empty());
    }

    #[tokio::test]
    async fn existing_file_is_overwritten_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("1_Morning Run.fit");
        std::fs::write(&existing, b"old").unwrap();
        let acts = vec![activity(1, "Morning Run", Some("running"))];
        let client = FakeClient::new(acts.clone());
        let refs: Vec<&ActivitySummary> = acts.iter().collect();

        export_activities(&client, &refs, &options(dir.path()), &mut Vec::<u8>::new())
            .await
            .unwrap();

        assert_eq!(std::fs::read(&existing).unwrap(), FakeClient::payload_for(1));
    }

    #[tokio::test]
    async fn activity_without_id_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut nameless = activity(0, "Ghost", None);
        nameless.activity_id = None;
        let acts = vec![nameless];
        let client = FakeClient::new(vec![]);
        let refs: Vec<&ActivitySummary> = acts.iter().collect();

        let mut out: Vec<u8> = Vec::new();
        let summary = export_activities(&client, &refs, &options(dir.path()), &mut out)
            .await
            .unwrap();

        assert_eq!(summary.skipped, 1);
        assert!(client.downloads().is_empty());
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn progress_write_failure_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let acts = vec![activity(1, "Morning Run", Some("running"))];
        let client = FakeClient::new(acts.clone());
        let refs: Vec<&ActivitySummary> = acts.iter().collect();

        let err = export_activities(&client, &refs, &options(dir.path()), &mut ClosedPipe)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn output_dir_under_a_file_is_reported_as_output_dir_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain-file");
        std::fs::write(&file, b"x").unwrap();

        let err = prepare_output_dir(&file.join("sub")).await.unwrap_err();

        assert!(matches!(err, ExportError::OutputDir { .. }));
        assert_eq!(err.user_message(), "Could not prepare the output directory.");
    }

    #[tokio::test]
    async fn prepare_output_dir_creates_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let resolved = prepare_output_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert!(resolved.is_absolute());
    }

    #[test]
    fn summary_lists_failures() {
        let summary = ExportSummary {
            written: vec![PathBuf::from("/out/1_Run.fit")],
            skipped: 0,
            failed: vec![FailedExport {
                activity_id: 2,
                error: "boom".into(),
            }],
        };
        let mut out: Vec<u8> = Vec::new();
        write_summary(&summary, Path::new("/out"), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Exported 1 activities to /out"));
        assert!(text.contains("  2: boom"));
        assert!(!text.contains("Skipped"));
    }
}
