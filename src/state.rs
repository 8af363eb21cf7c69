use std::sync::Arc;

use tower_http::services::ServeDir;

use crate::config::Config;
use crate::relay::RelayClient;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub relay: RelayClient,
    pub static_files: ServeDir,
}
