use tracing::trace;

use crate::tokenize::{render, tokenize};
use crate::{Atom, RuleError, RuleSet};

/// Default cap on the length of a reference chain (`a -> b -> c ...`).
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// The always-true check. A rule with an empty check allows everything, so it
/// is inlined as this constant rather than as nothing.
pub const ALWAYS: &str = "@";

/// Knobs for rule expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Longest reference chain allowed before expansion fails with
    /// [`RuleError::MaxDepthExceeded`]. `None` disables the limit; cycles are
    /// still reported as [`RuleError::CyclicReference`].
    pub max_depth: Option<usize>,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            max_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }
}

/// Inlines `rule:<name>` references against a borrowed [`RuleSet`].
///
/// An inlined rule whose own expansion is more than one atom is wrapped in
/// parentheses, so `a or rule:x and b` with `x = c or d` becomes
/// `a or (c or d) and b`. Single-atom expansions are spliced bare, and a rule
/// with an empty check is spliced as [`ALWAYS`].
///
/// # Example
///
/// ```
/// use ruleweave::{Expander, Rule, RuleSet};
///
/// let rules = RuleSet::new([
///     Rule::new("is_manager", "role:manager"),
///     Rule::new("is_owner", "rule:is_manager and project_id:%(project_id)s"),
/// ])
/// .unwrap();
///
/// let expanded = Expander::new(&rules).expand("rule:is_owner").unwrap();
/// assert_eq!(expanded, "(role:manager and project_id:%(project_id)s)");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Expander<'r> {
    rules: &'r RuleSet,
    options: ExpandOptions,
}

impl<'r> Expander<'r> {
    #[must_use]
    pub fn new(rules: &'r RuleSet) -> Self {
        Self::with_options(rules, ExpandOptions::default())
    }

    #[must_use]
    pub fn with_options(rules: &'r RuleSet, options: ExpandOptions) -> Self {
        Self { rules, options }
    }

    #[must_use]
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    /// Expand a check expression into its fully inlined, canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UnresolvedRule`] for a reference to a missing rule,
    /// [`RuleError::CyclicReference`] when a rule reaches itself, and
    /// [`RuleError::MaxDepthExceeded`] when the chain is longer than allowed.
    pub fn expand(&self, check: &str) -> Result<String, RuleError> {
        Ok(render(&self.expand_atoms(check)?))
    }

    /// Expand a check expression, returning the atom stream instead of a string.
    /// The result never contains [`Atom::RuleRef`].
    ///
    /// # Errors
    ///
    /// Same as [`expand()`](Self::expand).
    pub fn expand_atoms(&self, check: &str) -> Result<Vec<Atom>, RuleError> {
        let mut chain = Vec::new();
        self.expand_inner(check, &mut chain)
    }

    /// Expand the check expression of the named rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UnresolvedRule`] if `name` itself is missing, plus
    /// everything [`expand()`](Self::expand) reports.
    pub fn expand_rule(&self, name: &str) -> Result<String, RuleError> {
        let rule = self.rules.lookup(name)?;
        let mut chain = vec![rule.name.clone()];
        let atoms = self.expand_inner(&rule.check, &mut chain)?;
        if atoms.is_empty() {
            return Ok(ALWAYS.to_owned());
        }
        Ok(render(&atoms))
    }

    fn expand_inner(&self, check: &str, chain: &mut Vec<String>) -> Result<Vec<Atom>, RuleError> {
        let mut out = Vec::new();
        for atom in tokenize(check) {
            let Atom::RuleRef(name) = atom else {
                out.push(atom);
                continue;
            };

            let rule = self.rules.lookup(&name)?;

            if chain.contains(&name) {
                let mut path = chain.clone();
                path.push(name);
                return Err(RuleError::CyclicReference { path });
            }
            if let Some(limit) = self.options.max_depth {
                if chain.len() >= limit {
                    let mut path = chain.clone();
                    path.push(name);
                    return Err(RuleError::MaxDepthExceeded { limit, path });
                }
            }

            chain.push(name);
            let sub = self.expand_inner(&rule.check, chain)?;
            chain.pop();

            trace!(rule = %rule.name, atoms = sub.len(), "inlined rule reference");
            match sub.len() {
                0 => out.push(Atom::literal(ALWAYS)),
                1 => out.extend(sub),
                _ => {
                    out.push(Atom::Open);
                    out.extend(sub);
                    out.push(Atom::Close);
                }
            }
        }
        Ok(out)
    }
}

/// Expand `check` against `rules` with default options.
///
/// # Errors
///
/// See [`Expander::expand`].
pub fn expand(check: &str, rules: &RuleSet) -> Result<String, RuleError> {
    Expander::new(rules).expand(check)
}
