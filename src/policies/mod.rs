//! Bundled manager policy.
//!
//! The rule data lives in `.policy` files next to this module and is compiled
//! into the crate. Upstream defaults are never bundled: they are injected per
//! subsystem through a [`RuleSource`].

use std::fmt;

use crate::{InheritMode, PolicyBuilder, RuleSet, RuleSource, RuleweaveError};

const COMMON: &str = include_str!("common.policy");
const NETWORK: &str = include_str!("network.policy");
const NETWORK_DOMAIN: &str = include_str!("network_domain.policy");
const COMPUTE: &str = include_str!("compute.policy");
const BLOCK_STORAGE: &str = include_str!("blockstorage.policy");

/// An upstream subsystem whose default rules the manager policy extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    Network,
    Compute,
    BlockStorage,
}

impl Subsystem {
    pub const ALL: [Subsystem; 3] = [Subsystem::Network, Subsystem::Compute, Subsystem::BlockStorage];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Subsystem::Network => "network",
            Subsystem::Compute => "compute",
            Subsystem::BlockStorage => "blockstorage",
        }
    }

    /// The manager's own rules for this subsystem.
    ///
    /// # Errors
    ///
    /// Returns [`RuleweaveError`] if the bundled policy file is malformed.
    pub fn local_rules(self) -> Result<RuleSet, RuleweaveError> {
        let source = match self {
            Subsystem::Network => NETWORK,
            Subsystem::Compute => COMPUTE,
            Subsystem::BlockStorage => BLOCK_STORAGE,
        };
        RuleSet::from_dsl(source)
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rules every composed policy starts with (`is_manager`, `is_project_manager`).
///
/// # Errors
///
/// Returns [`RuleweaveError`] if the bundled policy file is malformed.
pub fn common_rules() -> Result<RuleSet, RuleweaveError> {
    RuleSet::from_dsl(COMMON)
}

/// Network rules for domain-scoped managers, written against `base_`-prefixed
/// upstream rules.
///
/// # Errors
///
/// Returns [`RuleweaveError`] if the bundled policy file is malformed.
pub fn domain_network_rules() -> Result<RuleSet, RuleweaveError> {
    RuleSet::from_dsl(NETWORK_DOMAIN)
}

/// The finished policy for one subsystem: common rules followed by the
/// subsystem's local rules, each augmented with the upstream rule of the same
/// name.
///
/// # Errors
///
/// Returns [`RuleweaveError`] if the upstream rules are inconsistent or the
/// composed policy does not validate.
pub fn manager_policy(
    subsystem: Subsystem,
    upstream: impl RuleSource,
) -> Result<RuleSet, RuleweaveError> {
    let policy = PolicyBuilder::new()
        .common(common_rules()?)
        .layer(subsystem.name(), subsystem.local_rules()?, upstream)
        .build()?;
    Ok(policy)
}

/// The network policy for domain-scoped managers, inheriting only the upstream
/// rules it references.
///
/// # Errors
///
/// Returns [`RuleweaveError`] if the upstream rules are inconsistent or the
/// composed policy does not validate.
pub fn domain_manager_network_policy(
    upstream: impl RuleSource,
) -> Result<RuleSet, RuleweaveError> {
    let policy = PolicyBuilder::new()
        .common(common_rules()?)
        .layer_with_mode(
            Subsystem::Network.name(),
            domain_network_rules()?,
            upstream,
            InheritMode::Referenced,
        )
        .build()?;
    Ok(policy)
}
