// src/pipeline/schedule.rs

//! Crawl scheduling: one list-page job per site.

use tracing::info;

use crate::bus::{BusPublisher, SUBJECT_LIST_PAGE, publish_json};
use crate::error::Result;
use crate::models::ListPageJob;
use crate::store::PageStore;

/// Synthesize and publish one `ListPageJob` for every known site, newest
/// first, then stamp each site's crawl time.
///
/// `first_crawl` is true for sites that have never been crawled; the
/// notification engine uses it to suppress pushes for the historical
/// backlog. Returns the number of jobs published.
pub async fn schedule_sites(store: &dyn PageStore, bus: &dyn BusPublisher) -> Result<usize> {
    let sites = store.list_sites().await?;
    let mut published = 0;

    for site in sites {
        let job = ListPageJob {
            site_id: site.id,
            site_name: site.name.clone(),
            url: site.list_url.clone(),
            list_crawl_type: site.list_crawl_type,
            detail_crawl_type: site.detail_crawl_type,
            rule: site.list_parse_rule.clone(),
            paywall: site.paywall,
            first_crawl: site.first_crawl,
        };
        publish_json(bus, SUBJECT_LIST_PAGE, &job).await?;
        store.mark_crawled(site.id).await?;
        published += 1;
        info!(site = %site.name, first_crawl = site.first_crawl, "scheduled list crawl");
    }

    Ok(published)
}
