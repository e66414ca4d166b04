//! Check-in handlers.

mod issue_token;
mod validate_token;

pub use issue_token::{IssueTokenCommand, IssueTokenHandler, IssueTokenResult};
pub use validate_token::{ValidateTokenCommand, ValidateTokenHandler, ValidateTokenResult};
