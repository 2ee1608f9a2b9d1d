//! Composition of layered authorization policy rules.
//!
//! A policy is a set of named rules, each guarded by a check expression such
//! as `role:admin or (role:member and project_id:%(project_id)s)`. Expressions
//! reference other rules with `rule:<name>`. This crate inlines those
//! references ([`Expander`]), and reconciles a locally authored rule set with
//! an externally owned upstream one ([`Reconciler`]) so local overrides extend
//! upstream access instead of replacing it.
//!
//! ```
//! use ruleweave::{Rule, RuleSet};
//!
//! let upstream = RuleSet::new([
//!     Rule::new("admin_only", "role:admin"),
//!     Rule::new("create_network", "rule:admin_only or role:member"),
//! ])
//! .unwrap();
//! let local = RuleSet::new([Rule::new("create_network", "role:manager")]).unwrap();
//!
//! let merged = ruleweave::reconcile(&local, &upstream).unwrap();
//! assert_eq!(
//!     merged.lookup("create_network").unwrap().check,
//!     "role:manager or (role:admin or role:member)"
//! );
//! ```

mod compose;
mod error;
mod expand;
mod reconcile;
mod types;

pub mod parse;
pub mod policies;
pub mod tokenize;

#[cfg(feature = "binary-cache")]
pub mod serial;

pub use compose::{InheritMode, PolicyBuilder, RuleSource};
pub use error::RuleweaveError;
pub use expand::{expand, ExpandOptions, Expander, ALWAYS, DEFAULT_MAX_DEPTH};
pub use reconcile::{augment, reconcile, Reconciler, DEFAULT_PREFIX};
pub use types::{Atom, Rule, RuleBuilder, RuleError, RuleSet, RuleSetBuilder};

#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};
