//! Reader for the `.policy` text format.
//!
//! ```text
//! # comment
//! rule is_manager "Rule for manager access":
//!     role:manager
//!
//! rule "create_network:segments":
//!     rule:is_project_manager
//! ```
//!
//! Names with `:` must be quoted. The check runs to the end of its line.

mod error;
mod grammar;
mod parser;

pub use error::ParseError;
pub use parser::ParsedPolicy;

use winnow::Parser;

/// Parse a policy file string into a [`ParsedPolicy`].
///
/// # Errors
///
/// Returns [`ParseError`] with the line and column where the input stops
/// being valid policy syntax.
pub fn parse(input: &str) -> Result<ParsedPolicy, ParseError> {
    grammar::parse_policy
        .parse(input)
        .map_err(|e| ParseError::at(input, e.offset(), e.inner().to_string()))
}
