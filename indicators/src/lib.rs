//! Indicator Catalog and Deficiency Scoring
//!
//! Field officers answer a fixed catalog of indicators about a village. Each
//! answer carries deficiency points, and the engine turns a completed sheet
//! into domain scores, a bounded total and an advisory recommendation.
//!
//! # Key Components
//!
//! - [`IndicatorCatalog`]: Read-only table of domains and indicators, validated at build time
//! - [`DomainProvider`]: Supplies one domain's indicators
//! - [`ScoringEngine`]: Scores complete [`ScoreSheet`]s and recommends eligibility
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use indicators::{IndicatorCatalog, ScoreSheet, ScoringEngine};
//!
//! let catalog = Arc::new(IndicatorCatalog::standard()?);
//! let engine = ScoringEngine::new(catalog.clone());
//!
//! let mut sheet = ScoreSheet::new();
//! sheet.answer(&catalog, "ws-piped-water", 2)?;
//! // ... answer the remaining indicators
//!
//! let assessment = engine.assess(&sheet)?;
//! println!("{} -> {:?}", assessment.report.total, assessment.recommendation);
//! ```

pub mod catalog;
pub mod domains;
pub mod engine;
pub mod types;

// Re-export main types
pub use catalog::{CatalogError, IndicatorCatalog};
pub use domains::DomainProvider;
pub use engine::{
    Assessment, ScoreReport, ScoreSheet, ScoringEngine, ScoringError,
    DEFAULT_ELIGIBILITY_THRESHOLD,
};
pub use types::*;
