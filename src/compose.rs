use tracing::debug;

use crate::{Reconciler, Rule, RuleError, RuleSet};

/// Supplier of an upstream authority's default rules.
///
/// Implemented for any `Fn() -> impl IntoIterator<Item = Rule>`, so a
/// subsystem's "list default rules" function can be injected directly, and
/// for [`RuleSet`] itself.
pub trait RuleSource {
    fn list_rules(&self) -> Vec<Rule>;
}

impl<F, I> RuleSource for F
where
    F: Fn() -> I,
    I: IntoIterator<Item = Rule>,
{
    fn list_rules(&self) -> Vec<Rule> {
        self().into_iter().collect()
    }
}

impl RuleSource for RuleSet {
    fn list_rules(&self) -> Vec<Rule> {
        self.all().to_vec()
    }
}

/// How a layer's local rules are merged with its upstream rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InheritMode {
    /// [`Reconciler::reconcile`]: OR each overridden rule with the expanded
    /// upstream rule.
    #[default]
    Augment,
    /// [`Reconciler::inherit_referenced`]: copy only the upstream rules local
    /// rules reference through the prefix.
    Referenced,
}

struct Layer<'a> {
    name: String,
    local: RuleSet,
    upstream: Box<dyn RuleSource + 'a>,
    mode: InheritMode,
}

/// Builds a finished policy from shared rules plus one reconciled layer per
/// upstream subsystem.
///
/// The result is checked before it is returned: names must be unique across
/// all layers and every `rule:<name>` reference must resolve. A policy that
/// fails either check is never produced.
///
/// # Example
///
/// ```
/// use ruleweave::{PolicyBuilder, Rule, RuleSet};
///
/// fn neutron_defaults() -> Vec<Rule> {
///     vec![Rule::new("create_network", "role:admin or role:member")]
/// }
///
/// let common = RuleSet::new([Rule::new("is_manager", "role:manager")]).unwrap();
/// let local = RuleSet::new([Rule::new("create_network", "rule:is_manager")]).unwrap();
///
/// let policy = PolicyBuilder::new()
///     .common(common)
///     .layer("network", local, neutron_defaults)
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     policy.lookup("create_network").unwrap().check,
///     "rule:is_manager or (role:admin or role:member)"
/// );
/// ```
#[derive(Default)]
pub struct PolicyBuilder<'a> {
    common: Vec<Rule>,
    layers: Vec<Layer<'a>>,
    reconciler: Reconciler,
}

impl<'a> PolicyBuilder<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules placed first in the output, shared by every layer.
    #[must_use]
    pub fn common(mut self, rules: RuleSet) -> Self {
        self.common.extend(rules.into_rules());
        self
    }

    #[must_use]
    pub fn reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    /// Add a layer reconciled with [`InheritMode::Augment`].
    #[must_use]
    pub fn layer(self, name: &str, local: RuleSet, upstream: impl RuleSource + 'a) -> Self {
        self.layer_with_mode(name, local, upstream, InheritMode::Augment)
    }

    #[must_use]
    pub fn layer_with_mode(
        mut self,
        name: &str,
        local: RuleSet,
        upstream: impl RuleSource + 'a,
        mode: InheritMode,
    ) -> Self {
        self.layers.push(Layer {
            name: name.to_owned(),
            local,
            upstream: Box::new(upstream),
            mode,
        });
        self
    }

    /// Reconcile every layer and assemble the final rule set.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::DuplicateRuleName`] for a name clash within an
    /// upstream listing or across the output, any expansion error from
    /// reconciliation, and [`RuleError::DanglingReference`] if the assembled
    /// policy references a rule it does not define.
    pub fn build(self) -> Result<RuleSet, RuleError> {
        let mut rules = self.common;

        for layer in self.layers {
            let upstream = RuleSet::new(layer.upstream.list_rules())?;
            let reconciled = match layer.mode {
                InheritMode::Augment => self.reconciler.reconcile(&layer.local, &upstream)?,
                InheritMode::Referenced => {
                    self.reconciler.inherit_referenced(&layer.local, &upstream)?
                }
            };
            debug!(
                layer = %layer.name,
                mode = ?layer.mode,
                upstream = upstream.len(),
                local = layer.local.len(),
                output = reconciled.len(),
                "reconciled policy layer"
            );
            rules.extend(reconciled.into_rules());
        }

        let policy = RuleSet::new(rules)?;
        policy.check_references()?;
        debug!(rules = policy.len(), "composed policy");
        Ok(policy)
    }
}
