//! Svar - Retrieval-Grounded FAQ Question Answering
//!
//! A CLI tool for answering questions from an FAQ knowledge base, grounded in retrieval.
//!
//! The name "Svar" comes from the Norwegian/Scandinavian word for "answer."
//!
//! # Overview
//!
//! Svar allows you to:
//! - Index a CSV of prompt/response pairs into a persisted vector index
//! - Ask natural-language questions answered only from your data
//! - See exactly which records grounded each answer
//! - Search the index semantically without generation
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `dataset` - FAQ record model and CSV ingestion
//! - `embedding` - Embedding generation
//! - `index` - Vector index abstraction and persistence
//! - `builder` - Index building with atomic replacement
//! - `generation` - Answer text generation
//! - `qa` - Question answering engine
//!
//! # Example
//!
//! ```rust,no_run
//! use svar::builder::IndexBuilder;
//! use svar::config::Settings;
//! use svar::index::{IndexHandle, IndexSource};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let handle = IndexHandle::new(settings.index_path());
//!
//!     let builder = IndexBuilder::from_settings(&settings);
//!     let report = builder
//!         .build(std::path::Path::new("faqs.csv"), &handle, IndexSource::Custom)
//!         .await?;
//!     println!("Indexed {} records", report.records_indexed);
//!
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod openai;
pub mod qa;

pub use error::{Result, SvarError};
