use std::collections::HashMap;
use std::fmt;

use super::error::RuleError;
use super::rule::Rule;

/// Builder for constructing a [`RuleSet`].
///
/// # Example
///
/// ```
/// use ruleweave::RuleSetBuilder;
///
/// let ruleset = RuleSetBuilder::new()
///     .rule("is_manager", |r| r.check("role:manager"))
///     .rule("is_project_manager", |r| {
///         r.check("rule:is_manager and project_id:%(project_id)s")
///             .description("Rule for domain manager ownership")
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(ruleset.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    rules: Vec<Rule>,
    missing_check: Option<String>,
}

/// Intermediate builder passed to the rule definition closure.
#[derive(Debug, Default)]
pub struct RuleBuilder {
    check: Option<String>,
    description: String,
}

impl RuleSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a rule. The closure must call `.check(expr)` to set the check
    /// expression.
    ///
    /// If `.check()` is not called, [`build()`](Self::build) fails with
    /// [`RuleError::MissingCheck`].
    #[must_use]
    pub fn rule(mut self, name: &str, f: impl FnOnce(RuleBuilder) -> RuleBuilder) -> Self {
        let builder = f(RuleBuilder::default());
        match builder.check {
            Some(check) => self.rules.push(Rule {
                name: name.to_owned(),
                check,
                description: builder.description,
            }),
            None => {
                if self.missing_check.is_none() {
                    self.missing_check = Some(name.to_owned());
                }
            }
        }
        self
    }

    /// Append an already constructed rule.
    #[must_use]
    pub fn push(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Finish the rule set.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::MissingCheck`] for a rule defined without a check,
    /// or any error [`RuleSet::new`] reports.
    pub fn build(self) -> Result<RuleSet, RuleError> {
        if let Some(rule) = self.missing_check {
            return Err(RuleError::MissingCheck { rule });
        }
        RuleSet::new(self.rules)
    }
}

impl RuleBuilder {
    /// Set the check expression for this rule.
    #[must_use]
    pub fn check(mut self, check: impl Into<String>) -> Self {
        self.check = Some(check.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// An insertion-ordered collection of uniquely named rules.
///
/// A `RuleSet` is immutable once built. Every operation that changes rules
/// (reconciliation, composition) produces a new set. Duplicate names are
/// rejected at construction rather than shadowed.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
}

impl RuleSet {
    /// Build a rule set from rules in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::DuplicateRuleName`] if two rules share a name and
    /// [`RuleError::EmptyRuleName`] if a rule has an empty name.
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Result<Self, RuleError> {
        let rules: Vec<Rule> = rules.into_iter().collect();
        let mut index = HashMap::with_capacity(rules.len());
        for (i, rule) in rules.iter().enumerate() {
            if rule.name.is_empty() {
                return Err(RuleError::EmptyRuleName);
            }
            if index.insert(rule.name.clone(), i).is_some() {
                return Err(RuleError::DuplicateRuleName {
                    name: rule.name.clone(),
                });
            }
        }
        Ok(Self { rules, index })
    }

    /// Look up a rule by name.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UnresolvedRule`] if no rule has that name.
    pub fn lookup(&self, name: &str) -> Result<&Rule, RuleError> {
        self.get(name).ok_or_else(|| RuleError::UnresolvedRule {
            name: name.to_owned(),
        })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.index.get(name).map(|&i| &self.rules[i])
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All rules in registration order.
    #[must_use]
    pub fn all(&self) -> &[Rule] {
        &self.rules
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }

    /// Returns the names a given rule references via `rule:<name>`.
    ///
    /// Returns `None` if the rule name is not found.
    #[must_use]
    pub fn dependencies_of(&self, rule_name: &str) -> Option<Vec<String>> {
        self.get(rule_name).map(Rule::references)
    }

    /// Verify that every `rule:<name>` reference in the set names a rule of the
    /// same set.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::DanglingReference`] for the first reference that
    /// does not resolve.
    pub fn check_references(&self) -> Result<(), RuleError> {
        for rule in &self.rules {
            for reference in rule.references() {
                if !self.contains(&reference) {
                    return Err(RuleError::DanglingReference {
                        rule: rule.name.clone(),
                        reference,
                    });
                }
            }
        }
        Ok(())
    }

    /// Inline every rule reference in `check` against this set.
    ///
    /// Shorthand for [`expand()`](crate::expand()) with default options.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] if a reference does not resolve or the reference
    /// chain is cyclic.
    pub fn expand(&self, check: &str) -> Result<String, RuleError> {
        crate::expand::expand(check, self)
    }

    /// Parse a policy file string into a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleweaveError`](crate::RuleweaveError) on parse failure or
    /// duplicate names.
    pub fn from_dsl(input: &str) -> Result<Self, crate::RuleweaveError> {
        let ruleset = crate::parse::parse(input)?.into_ruleset()?;
        Ok(ruleset)
    }

    /// Read a policy file and parse it into a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleweaveError`](crate::RuleweaveError) on I/O, parse, or
    /// construction failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::RuleweaveError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_dsl(&input)
    }
}

#[cfg(feature = "binary-cache")]
impl RuleSet {
    /// Serialize this rule set to a byte vector.
    ///
    /// The optional `source_text` is hashed (BLAKE3) and embedded in the
    /// payload metadata so callers can tell when the cache is stale.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(
        &self,
        source_text: Option<&str>,
    ) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self, source_text)
    }

    /// Deserialize a rule set previously produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }

    /// Read the source digest embedded by [`to_bytes`](Self::to_bytes), if any.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format or integrity failure.
    pub fn cached_source_digest(
        bytes: &[u8],
    ) -> Result<Option<[u8; 32]>, crate::serial::DeserializeError> {
        crate::serial::source_digest(bytes)
    }

    /// Serialize this rule set and write it to a file.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) on
    /// encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
        source_text: Option<&str>,
    ) -> Result<(), crate::serial::SerializeError> {
        let bytes = self.to_bytes(source_text)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a file and deserialize the rule set it contains.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// I/O, format, integrity, or validation failure.
    pub fn from_binary_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuleSet({} rules)", self.rules.len())
    }
}
