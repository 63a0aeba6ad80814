use super::ast::{BinaryOp, Node, UnaryOp};
use super::domain::{Domain, SpecConfig};
use super::error::TranslateError;
use super::parser::parse;
use super::transformation::sub_constants;
use super::tree::Tree;
use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;

const GR1C: &str = "gr1c";

/// Render a formula in gr1c syntax. Next is written by priming the
/// variables below it.
pub fn to_gr1c(node: &Node) -> Result<String, TranslateError> {
    render(node, false)
}

fn unsupported(construct: &'static str, node: &Node) -> TranslateError {
    TranslateError::Unsupported {
        target: GR1C,
        construct,
        formula: node.to_string(),
    }
}

fn render(node: &Node, primed: bool) -> Result<String, TranslateError> {
    let out = match node {
        Node::Var(name) if primed => format!("{name}'"),
        Node::Var(name) => name.clone(),
        Node::Bool(true) => "True".to_string(),
        Node::Bool(false) => "False".to_string(),
        Node::Num(n) => n.to_string(),
        Node::Str(_) => return Err(unsupported("string constant", node)),
        Node::Unary { op, operand } => match op {
            UnaryOp::Next if primed => {
                return Err(TranslateError::NestedNext {
                    target: GR1C,
                    formula: node.to_string(),
                });
            }
            UnaryOp::Next => render(operand, true)?,
            UnaryOp::Not => format!("!{}", render(operand, primed)?),
            UnaryOp::Always => format!("[]{}", render(operand, primed)?),
            UnaryOp::Eventually => format!("<>{}", render(operand, primed)?),
        },
        Node::Binary { op, left, right } => {
            let l = render(left, primed)?;
            let r = render(right, primed)?;
            match op {
                BinaryOp::Until => return Err(unsupported("until", node)),
                BinaryOp::Release => return Err(unsupported("release", node)),
                BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                    return Err(unsupported("arithmetic", node));
                }
                BinaryOp::Xor => format!("!({l} <-> {r})"),
                _ => format!("({l} {} {r})", op.symbol()),
            }
        }
    };
    Ok(out)
}

/// True if the whole of `s` is one parenthesized group.
fn is_grouped(s: &str) -> bool {
    if !s.starts_with('(') {
        return false;
    }
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == s.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

fn group(s: String) -> String {
    if is_grouped(&s) { s } else { format!("({s})") }
}

/// Write a whole specification as gr1c input.
///
/// Enumerated variables become integer variables indexed by their value
/// order; gr1c integer ranges must start at 0.
pub fn spec_to_gr1c(cfg: &SpecConfig) -> Result<String> {
    cfg.check()?;

    let domains = cfg.domains();
    let var_str2int: BTreeMap<String, Vec<String>> = domains
        .iter()
        .filter_map(|(name, dom)| match dom {
            Domain::Enum(values) => Some((name.clone(), values.clone())),
            _ => None,
        })
        .collect();

    let translate = |formula: &str| -> Result<String> {
        let mut tree = Tree::from_ast(&parse(formula)?);
        sub_constants(&mut tree, &var_str2int)?;
        let out = to_gr1c(&tree.to_ast()?)
            .with_context(|| format!("cannot translate '{formula}'"))?;
        Ok(out)
    };
    let section = |formulas: &[String], prefix: &str| -> Result<String> {
        let parts = formulas
            .iter()
            .map(|f| translate(f.as_str()).map(|g| format!("{prefix}{}", group(g))))
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join("\n    & "))
    };

    let mut out = String::new();
    out.push_str(&format!("ENV:{};\n", declarations(&cfg.env_vars)?));
    out.push_str(&format!("SYS:{};\n\n", declarations(&cfg.sys_vars)?));
    out.push_str(&format!("ENVINIT: {};\n", section(&cfg.env_init, "")?));
    out.push_str(&format!("ENVTRANS: {};\n", section(&cfg.env_safety, "[]")?));
    out.push_str(&format!("ENVGOAL: {};\n\n", section(&cfg.env_prog, "[]<>")?));
    out.push_str(&format!("SYSINIT: {};\n", section(&cfg.sys_init, "")?));
    out.push_str(&format!("SYSTRANS: {};\n", section(&cfg.sys_safety, "[]")?));
    out.push_str(&format!("SYSGOAL: {};\n", section(&cfg.sys_prog, "[]<>")?));
    tracing::debug!(bytes = out.len(), "rendered gr1c specification");
    Ok(out)
}

fn declarations(vars: &BTreeMap<String, Domain>) -> Result<String> {
    let mut out = String::new();
    for (name, domain) in vars {
        match domain {
            Domain::Boolean => out.push_str(&format!(" {name}")),
            Domain::Int { min: 0, max } => out.push_str(&format!(" {name} [0,{max}]")),
            Domain::Int { min, .. } => {
                bail!("gr1c integer ranges start at 0, but {name} starts at {min}")
            }
            Domain::Enum(values) if values.is_empty() => {
                bail!("enumerated variable {name} has no values")
            }
            Domain::Enum(values) => {
                out.push_str(&format!(" {name} [0,{}]", values.len() - 1));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::parse_spec_config;

    fn gr1c(formula: &str) -> Result<String, TranslateError> {
        to_gr1c(&parse(formula).expect("formula should parse"))
    }

    #[test]
    fn primes_variables_under_next() {
        assert_eq!(
            gr1c("[](park -> X(loc = 2 & !done))").unwrap(),
            "[](park -> ((loc' = 2) & !done'))"
        );
        assert_eq!(gr1c("x' != y").unwrap(), "(x' != y)");
    }

    #[test]
    fn primes_only_the_operand_before_the_quote() {
        assert_eq!(gr1c("x = y'").unwrap(), "(x = y')");
        assert_eq!(gr1c("x' = y'").unwrap(), "(x' = y')");
        assert_eq!(gr1c("loc = loc'").unwrap(), "(loc = loc')");
    }

    #[test]
    fn rewrites_xor_and_booleans() {
        assert_eq!(gr1c("a ^ TRUE").unwrap(), "!(a <-> True)");
        assert_eq!(gr1c("[]<>!false").unwrap(), "[]<>!False");
    }

    #[test]
    fn rejects_unsupported_operators() {
        assert!(matches!(
            gr1c("a U b"),
            Err(TranslateError::Unsupported {
                construct: "until",
                ..
            })
        ));
        assert!(matches!(
            gr1c("X X a"),
            Err(TranslateError::NestedNext { .. })
        ));
        assert!(matches!(
            gr1c("x + 1 = 2"),
            Err(TranslateError::Unsupported {
                construct: "arithmetic",
                ..
            })
        ));
        assert!(matches!(
            gr1c("m = \"on\""),
            Err(TranslateError::Unsupported {
                construct: "string constant",
                ..
            })
        ));
    }

    #[test]
    fn groups_only_when_needed() {
        assert!(is_grouped("(a & b)"));
        assert!(!is_grouped("(a) & (b)"));
        assert_eq!(group("!a".to_string()), "(!a)");
        assert_eq!(group("(a | b)".to_string()), "(a | b)");
    }

    #[test]
    fn renders_full_specification() {
        let cfg = parse_spec_config(
            r#"
            ENV_VARS
                park : boolean
            SYS_VARS
                loc : 0..29
                mode : {"idle", "busy"}
            ENV_PROG !park
            SYS_INIT loc = 0
            SYS_SAFETY
                park -> X(mode = "idle")
                loc' != 29 | mode = "busy"
            SYS_PROG loc = 29
            "#,
        )
        .unwrap();
        let out = spec_to_gr1c(&cfg).unwrap();
        let expected = "\
ENV: park;
SYS: loc [0,29] mode [0,1];

ENVINIT: ;
ENVTRANS: ;
ENVGOAL: []<>(!park);

SYSINIT: (loc = 0);
SYSTRANS: [](park -> (mode' = 0))
    & []((loc' != 29) | (mode = 1));
SYSGOAL: []<>(loc = 29);
";
        assert_eq!(out, expected);
    }

    #[test]
    fn translates_demo_spec() {
        let cfg = parse_spec_config(include_str!("../../demos/car.spec")).unwrap();
        let out = spec_to_gr1c(&cfg).unwrap();
        assert!(out.contains("[]((mode = 0) -> (loc' = loc))"), "{out}");
    }

    #[test]
    fn rejects_ranges_not_starting_at_zero() {
        let cfg = parse_spec_config("SYS_VARS\n  t : 1..4\nSYS_INIT t = 1").unwrap();
        let err = spec_to_gr1c(&cfg).unwrap_err();
        assert!(err.to_string().contains("start at 0"));
    }
}
