use crate::config::Config;
use crate::session::SessionStore;
use std::sync::Arc;

pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: SessionStore,
}
