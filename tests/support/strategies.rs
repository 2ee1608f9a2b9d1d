use proptest::prelude::*;
use ruleweave::{Rule, RuleSet};

use super::oracle::{self, Creds, Target};

// --- Fixed vocabulary ---
// roles      : admin, member, manager, reader
// project_id : p1, p2
// domain_id  : d1, d2

const ROLES: &[&str] = &["admin", "member", "manager", "reader"];
const PROJECTS: &[&str] = &["p1", "p2"];
const DOMAINS: &[&str] = &["d1", "d2"];

/// Leaf checks the oracle understands.
pub const LITERALS: &[&str] = &[
    "@",
    "!",
    "role:admin",
    "role:member",
    "role:manager",
    "project_id:%(project_id)s",
    "domain_id:%(domain_id)s",
    "project_id:p1",
];

/// Generate credentials drawn from the fixed vocabulary.
pub fn arb_creds() -> impl Strategy<Value = Creds> {
    (
        prop::sample::subsequence(ROLES, 0..=ROLES.len()),
        prop::option::of(prop::sample::select(PROJECTS)),
        prop::option::of(prop::sample::select(DOMAINS)),
    )
        .prop_map(|(roles, project, domain)| {
            let mut creds = Creds::new();
            for role in roles {
                creds = creds.role(role);
            }
            if let Some(project) = project {
                creds = creds.attr("project_id", project);
            }
            if let Some(domain) = domain {
                creds = creds.attr("domain_id", domain);
            }
            creds
        })
}

/// Generate a request target drawn from the fixed vocabulary.
pub fn arb_target() -> impl Strategy<Value = Target> {
    (prop::sample::select(PROJECTS), prop::sample::select(DOMAINS)).prop_map(
        |(project, domain)| oracle::target(&[("project_id", project), ("domain_id", domain)]),
    )
}

fn arb_leaf(refs: Vec<String>) -> BoxedStrategy<String> {
    let literal = prop::sample::select(LITERALS).prop_map(str::to_owned);
    if refs.is_empty() {
        literal.boxed()
    } else {
        let reference = prop::sample::select(refs).prop_map(|name| format!("rule:{name}"));
        prop_oneof![literal, reference].boxed()
    }
}

/// Generate a check expression over the literal pool and `rule:<name>` for
/// each name in `refs`.
///
/// Composite terms are always parenthesized, sometimes with the parens glued
/// to the operands and sometimes spaced out, so both tokenizer paths run.
pub fn arb_check(refs: Vec<String>) -> BoxedStrategy<String> {
    arb_leaf(refs)
        .prop_recursive(3, 24, 2, |inner| {
            prop_oneof![
                (inner.clone(), inner.clone(), any::<bool>())
                    .prop_map(|(a, b, glued)| paren(&format!("{a} and {b}"), glued)),
                (inner.clone(), inner.clone(), any::<bool>())
                    .prop_map(|(a, b, glued)| paren(&format!("{a} or {b}"), glued)),
                inner.prop_map(|a| format!("not {a}")),
            ]
        })
        .boxed()
}

fn paren(body: &str, glued: bool) -> String {
    if glued {
        format!("({body})")
    } else {
        format!("( {body} )")
    }
}

/// Name of the `i`th generated rule.
pub fn rule_name(i: usize) -> String {
    format!("r{i}")
}

/// Generate an acyclic rule set `r0..rN` where `ri` only references `rj` for
/// `j < i`.
pub fn arb_ruleset() -> impl Strategy<Value = RuleSet> {
    (1usize..=6).prop_flat_map(|n| {
        let checks: Vec<BoxedStrategy<String>> = (0..n)
            .map(|i| arb_check((0..i).map(rule_name).collect()))
            .collect();
        checks.prop_map(|checks| {
            RuleSet::new(
                checks
                    .into_iter()
                    .enumerate()
                    .map(|(i, check)| Rule::new(rule_name(i), check)),
            )
            .unwrap()
        })
    })
}
