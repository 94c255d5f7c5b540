//! termlens-common: Shared error type, sandboxed HTTP client and API key handling.

pub mod error;
pub mod sandbox;
pub mod secret;

// Re-export commonly used types
pub use error::{ErrorKind, Result, TermlensError};
pub use sandbox::SandboxClient;
pub use secret::{mask_url, ApiKey, API_KEY_PARAM, MASK};
