use std::collections::HashSet;

use tracing::debug;

use crate::expand::{ExpandOptions, Expander, ALWAYS};
use crate::tokenize::{render, tokenize};
use crate::{Atom, Rule, RuleError, RuleSet};

/// Prefix given to upstream rules copied into a local namespace.
pub const DEFAULT_PREFIX: &str = "base_";

/// Merges a local rule set with an upstream one so that local overrides widen
/// the upstream authority instead of replacing it.
///
/// Two modes are offered:
///
/// * [`reconcile`](Self::reconcile) ORs every overridden rule with the fully
///   expanded upstream definition: `<local> or (<upstream>)`.
/// * [`inherit_referenced`](Self::inherit_referenced) copies upstream rules
///   that local rules name explicitly as `rule:<prefix><name>`, unexpanded,
///   under the prefixed name.
///
/// Lookups of upstream equivalents are fail-soft: a local rule with no
/// upstream counterpart is kept as is. A dangling reference *inside* an
/// upstream rule is an error.
#[derive(Debug, Clone)]
pub struct Reconciler {
    prefix: String,
    retain_originals: bool,
    options: ExpandOptions,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_owned(),
            retain_originals: true,
            options: ExpandOptions::default(),
        }
    }
}

impl Reconciler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix used for renamed upstream rules.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Whether [`reconcile`](Self::reconcile) also emits the expanded upstream
    /// rule under its prefixed name, just before the augmented rule.
    #[must_use]
    pub fn retain_originals(mut self, retain: bool) -> Self {
        self.retain_originals = retain;
        self
    }

    #[must_use]
    pub fn expand_options(mut self, options: ExpandOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn prefixed(&self, name: &str) -> String {
        format!("{}{name}", self.prefix)
    }

    /// Augment every local rule that upstream also defines.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] when an upstream rule cannot be expanded, or
    /// [`RuleError::DuplicateRuleName`] when a renamed copy collides with a
    /// local name.
    pub fn reconcile(&self, local: &RuleSet, upstream: &RuleSet) -> Result<RuleSet, RuleError> {
        let expander = Expander::with_options(upstream, self.options);
        let mut out = Vec::with_capacity(local.len());

        for rule in local {
            let Some(original) = upstream.get(&rule.name) else {
                debug!(rule = %rule.name, "no upstream equivalent, keeping local rule");
                out.push(rule.clone());
                continue;
            };

            let expanded = expander.expand_rule(&original.name)?;
            debug!(rule = %rule.name, upstream = %expanded, "augmenting rule with upstream check");

            if self.retain_originals {
                out.push(Rule {
                    name: self.prefixed(&original.name),
                    check: expanded.clone(),
                    description: original.description.clone(),
                });
            }
            out.push(augment(rule, &expanded));
        }

        RuleSet::new(out)
    }

    /// Copy the upstream rules that local rules reference through the prefix,
    /// plus everything those rules reference in turn, then append the local
    /// rules.
    ///
    /// Copies keep their upstream check, with references rewritten to the
    /// prefixed names so the copied rules resolve among themselves.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UnresolvedRule`] when a copied upstream rule
    /// references a name upstream does not define, and
    /// [`RuleError::DuplicateRuleName`] on a name collision in the output.
    pub fn inherit_referenced(
        &self,
        local: &RuleSet,
        upstream: &RuleSet,
    ) -> Result<RuleSet, RuleError> {
        let local_refs = referenced_names(local);

        let mut wanted: HashSet<&str> = HashSet::new();
        let mut pending: Vec<&Rule> = Vec::new();
        for rule in upstream {
            if self.is_referenced_in(&rule.name, &local_refs) {
                wanted.insert(rule.name.as_str());
                pending.push(rule);
            }
        }

        while let Some(rule) = pending.pop() {
            for reference in rule.references() {
                let dependency = upstream.lookup(&reference)?;
                if wanted.insert(dependency.name.as_str()) {
                    pending.push(dependency);
                }
            }
        }

        let copies: Vec<Rule> = upstream
            .iter()
            .filter(|r| wanted.contains(r.name.as_str()))
            .map(|r| self.renamed(r))
            .collect();
        debug!(
            copied = copies.len(),
            local = local.len(),
            prefix = %self.prefix,
            "inherited referenced upstream rules"
        );

        RuleSet::new(copies.into_iter().chain(local.iter().cloned()))
    }

    /// Whether any local rule references the prefixed form of `upstream_name`.
    #[must_use]
    pub fn is_referenced_by(&self, upstream_name: &str, local: &RuleSet) -> bool {
        self.is_referenced_in(upstream_name, &referenced_names(local))
    }

    fn is_referenced_in(&self, upstream_name: &str, local_refs: &HashSet<String>) -> bool {
        local_refs.contains(&self.prefixed(upstream_name))
    }

    fn renamed(&self, rule: &Rule) -> Rule {
        let atoms: Vec<Atom> = tokenize(&rule.check)
            .into_iter()
            .map(|atom| match atom {
                Atom::RuleRef(name) => Atom::RuleRef(self.prefixed(&name)),
                other => other,
            })
            .collect();
        Rule {
            name: self.prefixed(&rule.name),
            check: render(&atoms),
            description: rule.description.clone(),
        }
    }
}

/// The augmented form of `local`: its own check OR'd with the expanded
/// upstream check. Every request `local` grants is still granted.
///
/// An empty check on either side allows everything and is written as
/// [`ALWAYS`].
#[must_use]
pub fn augment(local: &Rule, expanded_upstream: &str) -> Rule {
    Rule {
        name: local.name.clone(),
        check: format!(
            "{} or ({})",
            or_always(&local.check),
            or_always(expanded_upstream)
        ),
        description: local.description.clone(),
    }
}

fn or_always(check: &str) -> &str {
    if check.trim().is_empty() {
        ALWAYS
    } else {
        check
    }
}

/// Reconcile with default settings. See [`Reconciler::reconcile`].
///
/// # Errors
///
/// See [`Reconciler::reconcile`].
pub fn reconcile(local: &RuleSet, upstream: &RuleSet) -> Result<RuleSet, RuleError> {
    Reconciler::new().reconcile(local, upstream)
}

fn referenced_names(rules: &RuleSet) -> HashSet<String> {
    rules.iter().flat_map(Rule::references).collect()
}
