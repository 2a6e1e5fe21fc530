mod app_store;
mod catalog;
mod chat_flow;
mod connected_sources;
mod file_ingestion;
mod invalidation;
mod oauth_flow;
mod optimistic;
mod provider_browser;
mod query_cache;
mod resources;

pub use app_store::*;
pub use catalog::*;
pub use chat_flow::*;
pub use connected_sources::*;
pub use file_ingestion::*;
pub use invalidation::*;
pub use oauth_flow::*;
pub use optimistic::*;
pub use provider_browser::*;
pub use query_cache::*;
pub use resources::*;
