//! # Insightmate
//!
//! A personal-assistant backend: it ingests uploaded documents and
//! portfolio links into a single durable user-data record, and answers
//! chat queries either generically or personalized with the stored
//! content via a completion-service call (with a deterministic offline
//! fallback).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌─────────────┐
//! │ Uploads/URLs │──▶│   Ingestion    │──▶│  User Data   │
//! │ (HTTP / CLI) │   │ Validate+Extract│   │ Store (JSON) │
//! └──────────────┘   └───────────────┘   └──────┬──────┘
//!                                               │
//!                          ┌────────────────────┤
//!                          ▼                    ▼
//!                    ┌──────────┐        ┌──────────────┐
//!                    │ Context  │───────▶│     Chat      │
//!                    │ Assembler│        │   Responder   │
//!                    └──────────┘        └──────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Persisted data types |
//! | [`extract`] | File-content extraction (PDF, text, stubs) |
//! | [`webpage`] | URL fetching and HTML-to-text reduction |
//! | [`ingest`] | Upload validation and ingestion pipeline |
//! | [`store`] | Durable user-data store |
//! | [`context`] | Bounded context assembly for the LLM |
//! | [`responder`] | Completion call + offline fallback |
//! | [`server`] | HTTP API server |

pub mod config;
pub mod context;
pub mod extract;
pub mod ingest;
pub mod models;
pub mod responder;
pub mod server;
pub mod store;
pub mod webpage;
