//! termlens-web: Browser front end for the NLM terminology services.
//! Provides:
//!   - UMLS query page (search, concept / code details, related entities)
//!   - JSON API over the same session transitions
//!   - RxNav NDC ↔ RXCUI conversion with JSON download
//!   - Health check

pub mod error;
pub mod handlers;
pub mod render;
pub mod router;
pub mod state;
