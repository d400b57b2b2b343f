// src/lib.rs
//! Scrapes promotional-product catalogs and normalizes them into the JSON
//! catalog read by the storefront.

pub mod catalog;
pub mod classify;
pub mod config;
pub mod crawl;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod images;
pub mod merge;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod seo;
pub mod slug;
pub mod source;

pub use error::{Result, ScraperError};
pub use model::{Category, NormalizedProduct, RawScrapedRecord};
pub use pipeline::{normalize, run_normalize, run_scrape, NormalizeContext, NormalizeOutcome, NormalizePaths};
