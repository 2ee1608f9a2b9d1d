mod error;
mod rule;
mod ruleset;
mod token;

pub use error::RuleError;
pub use rule::Rule;
pub use ruleset::{RuleBuilder, RuleSet, RuleSetBuilder};
pub use token::Atom;
