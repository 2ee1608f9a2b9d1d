use std::fmt;

/// One logical token of a check expression.
///
/// Parentheses glued to a word (`(rule:a`, `b))`) are split into their own
/// atoms, one per character, so grouping survives rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    /// Operator, attribute check, constant, or any other opaque word.
    Literal(String),
    Open,
    Close,
    /// A `rule:<name>` reference to another rule.
    RuleRef(String),
}

impl Atom {
    pub fn literal(text: impl Into<String>) -> Self {
        Atom::Literal(text.into())
    }

    pub fn rule_ref(name: impl Into<String>) -> Self {
        Atom::RuleRef(name.into())
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Literal(text) => write!(f, "{text}"),
            Atom::Open => write!(f, "("),
            Atom::Close => write!(f, ")"),
            Atom::RuleRef(name) => write!(f, "rule:{name}"),
        }
    }
}
