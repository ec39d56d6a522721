pub mod error;
pub mod message;
pub mod traits;
pub mod types;

pub use error::{ScribeError, ScribeResult, SummarizerError};
pub use message::{Message, MessageView};
pub use traits::{Summarizer, SummaryPayload};
pub use types::{new_session_id, Role, SessionId};
