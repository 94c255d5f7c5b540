//! termlens-core: Query orchestration for the terminology browser.
//! - Query parameters and the vocabulary catalog
//! - Address-bar state (shareable links, never carrying the API key)
//! - Selection context for drilling into a result
//! - Response → table mapping
//! - The per-session state machine with request-generation tickets

pub mod address;
pub mod query;
pub mod selection;
pub mod session;
pub mod table;

pub use address::AddressState;
pub use query::{QueryParams, VocabularyCatalog};
pub use selection::{RelatedDirection, SelectionContext};
pub use session::{Output, Phase, Session, Ticket, View, NOT_IN_RESULTS};
pub use table::{Cell, CellAction, NoticeKind, Row, Table};
