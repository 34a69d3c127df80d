//! Word frequency analysis with a bounded history.
//!
//! `tokenizer` turns text into ranked word counts, `store` abstracts the
//! history persistence, `service` ties both together under the history cap and
//! `csv` renders exports. `routes` exposes it all over HTTP.

pub mod csv;
pub mod routes;
pub mod service;
pub mod store;
pub mod tokenizer;

pub use service::{AnalysisService, CreateAnalysisInput, HISTORY_LIMIT};
pub use store::HistoryStore;
