mod api;
mod api_error;
mod app_state;
mod chat;
mod external_file;
mod file;
mod identity;
mod knowledge_base;
mod llm;
mod query_key;
mod route;
mod storage;

pub use api::*;
pub use api_error::*;
pub use app_state::*;
pub use chat::*;
pub use external_file::*;
pub use file::*;
pub use identity::*;
pub use knowledge_base::*;
pub use llm::*;
pub use query_key::*;
pub use route::*;
pub use storage::*;
