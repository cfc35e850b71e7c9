//! Drain one target's paginated listings.

use land_client::LandError;
use tracing::{debug, info, warn};

use crate::common::{CaptureStamp, Credential};
use crate::domains::collection::models::NormalizedListing;
use crate::domains::collection::types::{CollectorSettings, TargetHarvest};
use crate::kernel::BaseListingSource;

/// Fetch every page of `target`, keeping only allow-listed trade types.
///
/// Pages are requested strictly in order starting from 1. The loop ends when
/// the source reports no more data, when a fetch fails, or when
/// `settings.max_pages` pages have been read. `settings.page_delay` is slept
/// between two successful pages, never after the last one.
///
/// A failed fetch is not an error here: the harvest carries whatever the
/// earlier pages produced and records the failure for the caller.
pub async fn collect_target(
    source: &dyn BaseListingSource,
    target: &str,
    credential: &Credential,
    settings: &CollectorSettings,
    stamp: &CaptureStamp,
) -> TargetHarvest {
    let mut harvest = TargetHarvest {
        target: target.to_string(),
        listings: Vec::new(),
        pages_fetched: 0,
        failure: None,
        credential_rejected: false,
    };

    info!(target = %target, worker = %credential.id, "Fetching articles");

    let mut page = 1;
    loop {
        let result = match source.fetch_page(target, credential, page).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    target = %target,
                    page,
                    error = %e,
                    "Page fetch failed, keeping earlier pages"
                );
                harvest.credential_rejected = e
                    .downcast_ref::<LandError>()
                    .is_some_and(LandError::is_auth_failure);
                harvest.failure = Some(format!("page {}: {:#}", page, e));
                break;
            }
        };

        harvest.pages_fetched += 1;
        let raw_count = result.article_list.len();
        harvest.listings.extend(NormalizedListing::from_articles(
            target,
            result.article_list,
            stamp,
        ));

        debug!(
            target = %target,
            page,
            articles = raw_count,
            more = result.is_more_data,
            "Page fetched"
        );

        if !result.is_more_data {
            break;
        }

        if page >= settings.max_pages {
            warn!(
                target = %target,
                max_pages = settings.max_pages,
                "Source still reports more data at the page limit, stopping"
            );
            break;
        }

        tokio::time::sleep(settings.page_delay).await;
        page += 1;
    }

    info!(
        target = %target,
        pages = harvest.pages_fetched,
        listings = harvest.listings.len(),
        complete = harvest.is_complete(),
        "Finished fetching target"
    );

    harvest
}
