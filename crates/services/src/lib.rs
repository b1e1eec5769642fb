pub mod cache;
pub mod error;
pub mod http;
pub mod memory;

pub use cache::CachedContentProvider;
pub use error::ServiceError;
pub use http::{Endpoint, HttpAssessmentService, HttpContentProvider, HttpProgressStore};
pub use memory::InMemoryProgressStore;
