pub mod domain;
pub mod service;

pub use domain::{ContentError, PostFilter, PostOrder, PostStatus, FEATURED_LIMIT};
pub use service::{ContentService, ServiceError};
