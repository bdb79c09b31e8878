pub mod config;
pub mod error;
pub mod event;
pub mod validate;

pub use config::AppConfig;
pub use error::IngestError;
pub use event::{Framework, IngestPayload, Method, PrivacyLevel, RequestData, StoredRow};
