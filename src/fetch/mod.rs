//! Retrieval of raw documents and API payloads from remote publishers.

mod client;
pub mod links;
pub mod pagination;
pub mod url_template;

pub use client::Fetcher;
pub use links::discover_links;
pub use pagination::{fan_out, PaginationConfig, Paginator};
pub use url_template::{expand_all, UrlTemplate};
