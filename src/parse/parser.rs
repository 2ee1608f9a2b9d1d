use crate::{Rule, RuleError, RuleSet};

/// Rules read from a policy file, in file order, before name validation.
#[derive(Debug)]
pub struct ParsedPolicy {
    pub rules: Vec<Rule>,
}

impl ParsedPolicy {
    /// Names of the parsed rules in file order. May contain duplicates.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    /// Validate the parsed rules into a [`RuleSet`].
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::DuplicateRuleName`] when the file defines a name
    /// twice.
    pub fn into_ruleset(self) -> Result<RuleSet, RuleError> {
        RuleSet::new(self.rules)
    }
}
