//! Splitting check expressions into [`Atom`]s and joining them back.
//!
//! Words are separated by runs of whitespace. Each run of `(` glued to the
//! front of a word and each run of `)` glued to its back becomes one paren atom
//! per character, so `((rule:a` yields two [`Atom::Open`] followed by the
//! reference. Rendering is the inverse up to whitespace: one space between
//! atoms, none after an open paren or before a close paren.

use winnow::combinator::preceded;
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::take_while;

use crate::Atom;

/// Characters allowed in the name of a `rule:<name>` reference.
///
/// Word characters plus `:`, since upstream rule names are namespaced with
/// colons (`create_network:segments`). This is wider than a plain identifier
/// on purpose: the whole word is the name, so `rule:create_network:segments`
/// never resolves to a `create_network` prefix.
pub(crate) fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == ':'
}

fn rule_reference<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    preceded("rule:", take_while(1.., is_name_char)).parse_next(input)
}

fn classify(word: &str) -> Atom {
    match rule_reference.parse(word) {
        Ok(name) => Atom::RuleRef(name.to_owned()),
        Err(_) => Atom::Literal(word.to_owned()),
    }
}

/// Split a check expression into a flat atom stream.
///
/// Words made only of parentheses produce only paren atoms; no empty literal
/// is ever emitted.
#[must_use]
pub fn tokenize(check: &str) -> Vec<Atom> {
    let mut atoms = Vec::new();
    for word in check.split_whitespace() {
        let rest = word.trim_start_matches('(');
        atoms.extend((0..word.len() - rest.len()).map(|_| Atom::Open));

        let core = rest.trim_end_matches(')');
        if !core.is_empty() {
            atoms.push(classify(core));
        }
        atoms.extend((0..rest.len() - core.len()).map(|_| Atom::Close));
    }
    atoms
}

/// Join atoms into a minimally spaced expression string.
#[must_use]
pub fn render(atoms: &[Atom]) -> String {
    let mut out = String::new();
    let mut after_open = false;
    for atom in atoms {
        if !out.is_empty() && !after_open && *atom != Atom::Close {
            out.push(' ');
        }
        match atom {
            Atom::Literal(text) => out.push_str(text),
            Atom::Open => out.push('('),
            Atom::Close => out.push(')'),
            Atom::RuleRef(name) => {
                out.push_str("rule:");
                out.push_str(name);
            }
        }
        after_open = *atom == Atom::Open;
    }
    out
}

/// Whitespace-normalize an expression without changing its structure.
#[must_use]
pub fn canonicalize(check: &str) -> String {
    render(&tokenize(check))
}
