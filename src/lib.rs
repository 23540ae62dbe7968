//! # village-compare
//!
//! A retrieval-augmented service that compares the sustainability of two
//! villages from their free-text profile documents and recommends actions
//! grounded in a curated problem/solution knowledge base.
//!
//! ## Architecture
//!
//! Every request runs the same short pipeline:
//!
//! ```text
//!        ┌──────────────┐
//!        │ HTTP request │  /compare  /recommend  /data
//!        └──────┬───────┘
//!               │ validate
//!               ▼
//!     ┌───────────────────┐
//!     │   Profile Store   │  name → profile, loaded once per name
//!     │ (chunked on load) │
//!     └─────────┬─────────┘
//!               │ NOT_FOUND short-circuits here
//!               ▼
//!     ┌───────────────────┐
//!     │     Retriever     │  criteria filter, ≤ N chunks per village
//!     │ (section or BM25) │
//!     └─────────┬─────────┘
//!               │
//!       ┌───────┴────────┐
//!       ▼                ▼
//! ┌────────────┐  ┌────────────────┐
//! │ Comparison │  │ Recommendation │
//! │ Generator  │  │   Generator    │
//! │ (backend,  │  │ (lexical gaps  │
//! │  deadline) │  │  → knowledge)  │
//! └─────┬──────┘  └───────┬────────┘
//!       └────────┬────────┘
//!                ▼
//!          JSON response
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for data paths, retrieval and LLM settings
//! - [`error`] - Pipeline error taxonomy and its HTTP mapping
//! - [`models`] - Shared data types: `Category`, `Chunk`, `EntityProfile`, request/response bodies
//! - [`lexicon`] - Per-category cue terms for indicator counting and shortfall detection
//! - [`profiles`] - Profile corpus scan and the per-name cached Profile Store
//! - [`chunking`] - Section-aware chunker with a size-bounded fallback splitter
//! - [`knowledge`] - Problem/solution corpus parser and keyword index
//! - [`search`] - Retriever trait with section-order and BM25 (tantivy) implementations
//! - [`llm`] - Narrative backends: streamed Ollama/OpenAI chat and an offline extractive writer
//! - [`generate`] - Comparison and recommendation generators
//! - [`pipeline`] - Request lifecycle state machine driving each request
//! - [`api`] - Axum HTTP handlers and router
//! - [`state`] - Shared application state built once at startup

pub mod api;
pub mod chunking;
pub mod config;
pub mod error;
pub mod generate;
pub mod knowledge;
pub mod lexicon;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod profiles;
pub mod search;
pub mod state;
