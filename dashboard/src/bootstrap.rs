use crate::api::ApiClient;
use crate::cctv::{load_cctv_streams, CctvOptions, StreamOutcome};
use crate::config::Config;
use crate::page::DashboardPage;

/// Runs once the page is ready. Returns `None` when CCTV auto-load is off.
pub async fn on_content_loaded(
    config: &Config,
    api: &ApiClient,
    page: &mut DashboardPage,
) -> Option<Vec<StreamOutcome>> {
    if !config.auto_load_cctv {
        log::info!("CCTV auto-load disabled");
        return None;
    }
    log::info!("Page loaded, starting CCTV streams");
    Some(load_cctv_streams(api, &mut page.cctv, CctvOptions::from(config)).await)
}
