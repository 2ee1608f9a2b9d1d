use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("unable to resolve referenced rule '{name}'")]
    UnresolvedRule { name: String },

    #[error("duplicate rule name '{name}'")]
    DuplicateRuleName { name: String },

    #[error("cyclic rule reference detected: {}", path.join(" -> "))]
    CyclicReference { path: Vec<String> },

    #[error("rule expansion exceeded maximum depth {limit}: {}", path.join(" -> "))]
    MaxDepthExceeded { limit: usize, path: Vec<String> },

    #[error("rule '{rule}' has no check expression")]
    MissingCheck { rule: String },

    #[error("rule name must not be empty")]
    EmptyRuleName,

    #[error("rule '{rule}' references undefined rule '{reference}'")]
    DanglingReference { rule: String, reference: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_rule_message() {
        let err = RuleError::UnresolvedRule {
            name: "ghost".into(),
        };
        assert_eq!(err.to_string(), "unable to resolve referenced rule 'ghost'");
    }

    #[test]
    fn duplicate_rule_message() {
        let err = RuleError::DuplicateRuleName {
            name: "is_manager".into(),
        };
        assert_eq!(err.to_string(), "duplicate rule name 'is_manager'");
    }

    #[test]
    fn cyclic_reference_message() {
        let err = RuleError::CyclicReference {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "cyclic rule reference detected: a -> b -> a");
    }

    #[test]
    fn max_depth_message() {
        let err = RuleError::MaxDepthExceeded {
            limit: 2,
            path: vec!["a".into(), "b".into(), "c".into()],
        };
        assert_eq!(
            err.to_string(),
            "rule expansion exceeded maximum depth 2: a -> b -> c"
        );
    }

    #[test]
    fn dangling_reference_message() {
        let err = RuleError::DanglingReference {
            rule: "create_network".into(),
            reference: "is_project_manager".into(),
        };
        assert_eq!(
            err.to_string(),
            "rule 'create_network' references undefined rule 'is_project_manager'"
        );
    }
}
