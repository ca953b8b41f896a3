//! Retrieval-augmented generation core.
//!
//! - [`chunker`]: fixed-policy overlapping text chunking
//! - [`store`]: documents and chunk vectors, brute-force cosine retrieval
//! - [`ingest`]: upload → extract → chunk → embed → persist
//! - [`answer`]: question → retrieve → complete → record exchange

pub mod answer;
pub mod chunker;
pub mod ingest;
pub mod store;
