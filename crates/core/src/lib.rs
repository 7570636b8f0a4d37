//! Core types and shared functionality for productshot.
//!
//! This crate provides:
//! - In-memory result cache with TTL
//! - The image provider capability and the resilient fetch orchestrator
//! - The border-whiteness product-photo validator
//! - The query pipeline driver
//! - Unified error types and configuration

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod pipeline;
pub mod provider;
pub mod validate;

pub use cache::{CacheEntry, ResultCache, normalize_key};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use fetcher::{AttemptOutcome, CandidateSource, FetchReport, ProviderAttempt, ResilientFetcher};
pub use pipeline::{AcceptedImage, Downloader, Pipeline, QueryOutcome, RunSummary};
pub use provider::{ImageProvider, is_candidate_location};
pub use validate::{ProductPhotoValidator, ValidationResult};
