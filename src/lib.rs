pub mod cache;
pub mod config;
pub mod console;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod platforms;
pub mod store;
