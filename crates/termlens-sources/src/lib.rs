//! termlens-sources: REST clients for the NLM terminology services.
//! - UTS (UMLS Terminology Services): search, concept / code content, related entities
//! - RxNav: NDC ↔ RXCUI conversion
//!
//! All calls go through [`transport::JsonTransport`], which the sandboxed
//! reqwest client implements and [`transport::MockTransport`] fakes in tests.

pub mod models;
pub mod request;
pub mod rxnav;
pub mod transport;
pub mod uts;

pub use models::{DetailKind, ReturnIdType};
pub use request::{PreparedRequest, RequestTrace};
pub use rxnav::RxNavClient;
pub use transport::{JsonTransport, MockTransport};
pub use uts::{UtsClient, UtsEndpoints};
