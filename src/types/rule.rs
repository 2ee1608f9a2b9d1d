use std::fmt;

/// A named authorization rule: a check expression plus free-text description.
///
/// The check expression is kept as the string the author wrote. It is only
/// tokenized when something needs its structure (expansion, reference
/// collection, renaming).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub check: String,
    pub description: String,
}

impl Rule {
    pub fn new(name: impl Into<String>, check: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            check: check.into(),
            description: String::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Names referenced by `rule:<name>` tokens in this rule's check, in order of
    /// first appearance.
    #[must_use]
    pub fn references(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for atom in crate::tokenize::tokenize(&self.check) {
            if let super::Atom::RuleRef(name) = atom {
                if !out.contains(&name) {
                    out.push(name);
                }
            }
        }
        out
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\": \"{}\"", self.name, self.check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_in_order_without_repeats() {
        let rule = Rule::new(
            "r",
            "(rule:b and rule:a) or rule:b or role:admin",
        );
        assert_eq!(rule.references(), vec!["b".to_owned(), "a".to_owned()]);
    }

    #[test]
    fn display_uses_policy_file_shape() {
        let rule = Rule::new("is_manager", "role:manager").with_description("Manager");
        assert_eq!(rule.to_string(), r#""is_manager": "role:manager""#);
        assert_eq!(rule.description, "Manager");
    }
}
