mod client;
mod endpoints;
mod envelope;

pub use client::ApiClient;
pub use endpoints::Endpoint;
pub use envelope::{extract_collection, Envelope, Pagination};
