//! A small reference evaluator for check expressions, used only by tests to
//! compare what expressions *mean* before and after rewriting.
//!
//! Precedence: `or` < `and` < `not` < primary. `rule:<name>` is resolved
//! lazily against a rule set, the way an enforcer would at request time.

use std::collections::{HashMap, HashSet};

use ruleweave::tokenize::tokenize;
use ruleweave::{Atom, RuleSet};

/// The caller's credentials: roles plus scope attributes.
#[derive(Debug, Clone, Default)]
pub struct Creds {
    pub roles: HashSet<String>,
    pub attrs: HashMap<String, String>,
}

impl Creds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, role: &str) -> Self {
        self.roles.insert(role.to_owned());
        self
    }

    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.attrs.insert(key.to_owned(), value.to_owned());
        self
    }
}

/// Attributes of the resource being acted on.
pub type Target = HashMap<String, String>;

pub fn target(pairs: &[(&str, &str)]) -> Target {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

/// Evaluate `check`, resolving references against `rules`.
///
/// # Panics
///
/// Panics on malformed expressions or unresolved references.
pub fn evaluate(check: &str, rules: &RuleSet, creds: &Creds, target: &Target) -> bool {
    let atoms = tokenize(check);
    if atoms.is_empty() {
        return true;
    }
    let mut eval = Eval {
        atoms: &atoms,
        pos: 0,
        rules,
        creds,
        target,
        check,
    };
    let result = eval.or_expr();
    assert_eq!(eval.pos, atoms.len(), "trailing tokens in {check:?}");
    result
}

/// Evaluate a named rule of `rules`.
pub fn evaluate_rule(name: &str, rules: &RuleSet, creds: &Creds, target: &Target) -> bool {
    let rule = rules
        .lookup(name)
        .unwrap_or_else(|e| panic!("cannot evaluate {name}: {e}"));
    evaluate(&rule.check, rules, creds, target)
}

struct Eval<'a> {
    atoms: &'a [Atom],
    pos: usize,
    rules: &'a RuleSet,
    creds: &'a Creds,
    target: &'a Target,
    check: &'a str,
}

impl Eval<'_> {
    fn eat_word(&mut self, word: &str) -> bool {
        match self.atoms.get(self.pos) {
            Some(Atom::Literal(w)) if w == word => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn or_expr(&mut self) -> bool {
        let mut value = self.and_expr();
        while self.eat_word("or") {
            let rhs = self.and_expr();
            value = value || rhs;
        }
        value
    }

    fn and_expr(&mut self) -> bool {
        let mut value = self.not_expr();
        while self.eat_word("and") {
            let rhs = self.not_expr();
            value = value && rhs;
        }
        value
    }

    fn not_expr(&mut self) -> bool {
        if self.eat_word("not") {
            !self.not_expr()
        } else {
            self.primary()
        }
    }

    fn primary(&mut self) -> bool {
        let atom = self
            .atoms
            .get(self.pos)
            .unwrap_or_else(|| panic!("unexpected end of {:?}", self.check));
        self.pos += 1;
        match atom {
            Atom::Open => {
                let value = self.or_expr();
                assert_eq!(
                    self.atoms.get(self.pos),
                    Some(&Atom::Close),
                    "unbalanced parens in {:?}",
                    self.check
                );
                self.pos += 1;
                value
            }
            Atom::Literal(word) => self.literal(word),
            Atom::RuleRef(name) => evaluate_rule(name, self.rules, self.creds, self.target),
            Atom::Close => panic!("unexpected ')' in {:?}", self.check),
        }
    }

    fn literal(&self, word: &str) -> bool {
        match word {
            "@" => return true,
            "!" => return false,
            _ => {}
        }
        let (kind, match_value) = word
            .split_once(':')
            .unwrap_or_else(|| panic!("unknown check {word:?} in {:?}", self.check));
        if kind == "role" {
            return self.creds.roles.contains(match_value);
        }
        let Some(actual) = self.creds.attrs.get(kind) else {
            return false;
        };
        match match_value
            .strip_prefix("%(")
            .and_then(|rest| rest.strip_suffix(")s"))
        {
            Some(field) => self.target.get(field) == Some(actual),
            None => actual == match_value,
        }
    }
}
