//! Full activity history listing.

use garmin_connect_client::{ActivitySummary, GarminClient, GarminError};
use std::num::{NonZeroU32, NonZeroUsize};

/// Page through the activity list until the service runs out of records.
///
/// Only an empty page ends the listing. The service may cap the page size
/// below `batch_size`, so a short page is not taken as the end and the next
/// request starts after the records actually received. When `max_activities`
/// is set the result is truncated to that many records. Any error aborts the
/// listing: a partial history must not be presented as the complete one.
pub async fn fetch_all_activities(
    client: &dyn GarminClient,
    batch_size: NonZeroU32,
    max_activities: Option<NonZeroUsize>,
) -> Result<Vec<ActivitySummary>, GarminError> {
    let batch_size = batch_size.get();
    let max_activities = max_activities.map(NonZeroUsize::get);
    let mut activities: Vec<ActivitySummary> = Vec::new();
    let mut start: u32 = 0;

    loop {
        let page = client.get_activities(start, batch_size).await?;
        let page_len = page.len();
        tracing::debug!(start, page_len, "fetched activity page");
        if page_len == 0 {
            break;
        }
        activities.extend(page);

        if let Some(max) = max_activities
            && activities.len() >= max
        {
            activities.truncate(max);
            break;
        }
        tracing::info!("Fetched {} activities so far...", activities.len());

        start = start.saturating_add(u32::try_from(page_len).unwrap_or(u32::MAX));
    }

    tracing::info!(total = activities.len(), "activity listing complete");
    Ok(activities)
}
