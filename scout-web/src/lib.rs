//! Web search and page acquisition.
//!
//! - Search provider seam ([`SearchProvider`]) and its Tavily implementation (`tavily`)
//! - Detail page fetching behind [`PageFetcher`] (`fetch`)
//! - HTML to plain text conversion (`extract`)

pub mod extract;
pub mod fetch;
pub mod provider;
pub mod tavily;

pub use fetch::{HttpPageFetcher, PageFetcher};
pub use provider::{SearchDepth, SearchProvider, SearchRequest};
pub use tavily::TavilyApi;
