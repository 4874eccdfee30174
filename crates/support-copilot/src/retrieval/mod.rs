//! Knowledge base retrieval

mod search;

pub use search::{Retriever, RELEVANCE_THRESHOLD};
