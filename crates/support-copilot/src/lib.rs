//! support-copilot: Retrieval-augmented drafting of customer support replies
//!
//! A knowledge base is chunked, embedded and stored in a vector index. For
//! each customer issue the pipeline detects the customer's tone, retrieves
//! relevant passages and drafts a grounded reply, falling back to a fixed
//! apology when generation keeps failing.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod logging;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod session;
pub mod types;

pub use config::CopilotConfig;
pub use error::{Error, Result};
pub use pipeline::{CopilotPipeline, Draft, DraftRequest, PipelineDeps};
pub use types::{GenerationResult, Outcome, RetrievedMatch, Tone};
