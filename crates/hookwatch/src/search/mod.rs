//! Search engine access: index bootstrap and create-only event writes.

mod client;
mod error;

pub use client::{
    EngineErrorDetail, IndexOutcome, SearchClient, SearchSettings, parse_engine_error,
};
pub use error::SearchError;
