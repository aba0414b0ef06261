//! Server crate for the FlickVault generation pipeline.
//!
//! This crate contains the orchestrator that coordinates suggestion,
//! enrichment, exclusion and dedup, the two delivery shapes over it
//! (event stream and synchronous aggregate), and the HTTP head.

pub mod config;
pub mod http;
pub mod orchestrator;

#[cfg(test)]
mod testing;

pub use orchestrator::{
    GenerationConfig, GenerationError, GenerationEvent, GenerationFailure, GenerationOrchestrator,
    GenerationOutcome, GenerationRequest, RunSummary,
};
