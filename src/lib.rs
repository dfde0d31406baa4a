pub mod config;
pub mod error;
pub mod events;
pub mod filters;
pub mod logging;
pub mod partition;
pub mod record;
pub mod request;
pub mod results;
pub mod searcher;
pub mod session;
mod worker;

pub use config::SearchConfig;
pub use error::{Result, SearchError};
pub use events::{SearchEvent, SearchSummary, SessionId};
pub use filters::{passes, DateFilter, SearchFilters, SizeFilter, TypeFilter};
pub use record::MatchRecord;
pub use request::SearchRequest;
pub use results::SearchResults;
pub use searcher::{FileSearcher, StopHandle};
