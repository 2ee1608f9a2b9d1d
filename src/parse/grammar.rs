use winnow::ascii::till_line_ending;
use winnow::combinator::{alt, cut_err, opt, preceded, repeat};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, take_while};

use crate::Rule;

use super::parser::ParsedPolicy;

// -- Whitespace & comments --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_ascii_whitespace()).void(),
            ('#', till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

// -- Names & strings --------------------------------------------------------

fn bare_name<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| {
            c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-'
        }),
    )
        .take()
        .parse_next(input)
}

fn string_literal(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn rule_name(input: &mut &str) -> ModalResult<String> {
    alt((string_literal, bare_name.map(str::to_owned)))
        .verify(|name: &String| !name.is_empty())
        .parse_next(input)
}

// -- Check expressions ------------------------------------------------------

/// The check runs to the end of the first non-blank line after the colon.
fn check_body<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    ws.parse_next(input)?;
    till_line_ending
        .map(str::trim)
        .verify(|check: &str| !check.is_empty())
        .parse_next(input)
}

// -- Rule definitions -------------------------------------------------------

fn rule_def(input: &mut &str) -> ModalResult<Rule> {
    ws.parse_next(input)?;
    "rule".parse_next(input)?;
    ws.parse_next(input)?;

    let name = cut_err(rule_name)
        .context(StrContext::Expected(StrContextValue::Description(
            "rule name",
        )))
        .parse_next(input)?;

    let description = opt(preceded(ws, string_literal)).parse_next(input)?;

    ws.parse_next(input)?;
    cut_err(':').parse_next(input)?;

    let check = cut_err(check_body)
        .context(StrContext::Expected(StrContextValue::Description(
            "check expression",
        )))
        .parse_next(input)?;

    Ok(Rule {
        name,
        check: check.to_owned(),
        description: description.unwrap_or_default(),
    })
}

// -- Top-level parser -------------------------------------------------------

pub fn parse_policy(input: &mut &str) -> ModalResult<ParsedPolicy> {
    let rules: Vec<Rule> = repeat(0.., rule_def).parse_next(input)?;
    ws.parse_next(input)?;
    Ok(ParsedPolicy { rules })
}

#[cfg(test)]
mod tests {
    use crate::parse::parse;

    #[test]
    fn parse_single_rule() {
        let result = parse("rule is_manager:\n    role:manager").unwrap();
        assert_eq!(result.rules.len(), 1);
        assert_eq!(result.rules[0].name, "is_manager");
        assert_eq!(result.rules[0].check, "role:manager");
        assert_eq!(result.rules[0].description, "");
    }

    #[test]
    fn parse_check_on_same_line() {
        let result = parse("rule is_manager: role:manager\n").unwrap();
        assert_eq!(result.rules[0].check, "role:manager");
    }

    #[test]
    fn parse_quoted_name_and_description() {
        let input = r#"
rule "create_network:segments" "Specify ``segments`` when creating a network":
    rule:is_project_manager
"#;
        let result = parse(input).unwrap();
        assert_eq!(result.rules[0].name, "create_network:segments");
        assert_eq!(
            result.rules[0].description,
            "Specify ``segments`` when creating a network"
        );
        assert_eq!(result.rules[0].check, "rule:is_project_manager");
    }

    #[test]
    fn parse_check_keeps_inner_spacing_and_parens() {
        let input = "rule r:\n    (rule:a and  domain_id:%(domain_id)s) or rule:b   \n";
        let result = parse(input).unwrap();
        assert_eq!(
            result.rules[0].check,
            "(rule:a and  domain_id:%(domain_id)s) or rule:b"
        );
    }

    #[test]
    fn parse_comments_and_blank_lines_ignored() {
        let input = "# Header\n\nrule a:\n    # the check follows\n\n    role:admin\n# trailer\n";
        let result = parse(input).unwrap();
        assert_eq!(result.rules.len(), 1);
        assert_eq!(result.rules[0].check, "role:admin");
    }

    #[test]
    fn parse_multiple_rules_in_order() {
        let input = "rule a:\n    role:admin\nrule b:\n    role:member\nrule c:\n    rule:a or rule:b";
        let result = parse(input).unwrap();
        let names: Vec<&str> = result.rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn parse_escaped_description() {
        let input = r#"rule r "say \"hi\"": @"#;
        let result = parse(input).unwrap();
        assert_eq!(result.rules[0].description, "say \"hi\"");
        assert_eq!(result.rules[0].check, "@");
    }

    #[test]
    fn parse_empty_input() {
        assert!(parse("").unwrap().rules.is_empty());
        assert!(parse("  # nothing here\n").unwrap().rules.is_empty());
    }

    #[test]
    fn parse_missing_check_is_error() {
        assert!(parse("rule a:\n").is_err());
        assert!(parse("rule a:").is_err());
    }

    #[test]
    fn parse_missing_colon_is_error() {
        assert!(parse("rule a\n    role:admin").is_err());
    }

    #[test]
    fn parse_missing_name_is_error() {
        assert!(parse("rule :\n    role:admin").is_err());
        assert!(parse("rule \"\":\n    role:admin").is_err());
    }

    #[test]
    fn parse_trailing_garbage_is_error() {
        assert!(parse("rule a: role:admin\nnonsense").is_err());
    }
}
