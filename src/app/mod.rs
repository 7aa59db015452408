pub mod cache;
pub mod router;
pub mod service;
pub mod source;
