use super::lexer::is_name;
use super::parser::parse;
use super::transformation::check_for_undefined_identifiers;
use super::tree::Tree;
use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

/// Type of a specification variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    Boolean,
    /// Inclusive integer range
    Int { min: i64, max: i64 },
    /// Finite set of string values
    Enum(Vec<String>),
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Boolean => f.write_str("boolean"),
            Domain::Int { min, max } => write!(f, "{min}..{max}"),
            Domain::Enum(values) => {
                f.write_str("{")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "\"{value}\"")?;
                }
                f.write_str("}")
            }
        }
    }
}

pub type Domains = BTreeMap<String, Domain>;

/// A GR(1) specification: variable domains for the environment and the
/// system, and the initial, safety and progress formulas of each.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecConfig {
    pub env_vars: Domains,
    pub sys_vars: Domains,
    pub env_init: Vec<String>,
    pub env_safety: Vec<String>,
    pub env_prog: Vec<String>,
    pub sys_init: Vec<String>,
    pub sys_safety: Vec<String>,
    pub sys_prog: Vec<String>,
}

impl SpecConfig {
    /// Environment and system domains together.
    pub fn domains(&self) -> Domains {
        self.env_vars
            .iter()
            .chain(self.sys_vars.iter())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Section name paired with its formulas, in file order.
    pub fn formula_sections(&self) -> [(&'static str, &[String]); 6] {
        [
            ("ENV_INIT", self.env_init.as_slice()),
            ("ENV_SAFETY", self.env_safety.as_slice()),
            ("ENV_PROG", self.env_prog.as_slice()),
            ("SYS_INIT", self.sys_init.as_slice()),
            ("SYS_SAFETY", self.sys_safety.as_slice()),
            ("SYS_PROG", self.sys_prog.as_slice()),
        ]
    }

    /// Parse every formula and check it against the declared domains.
    pub fn check(&self) -> Result<()> {
        let domains = self.domains();
        for (section, formulas) in self.formula_sections() {
            for formula in formulas {
                let node = parse(formula)
                    .with_context(|| format!("{section}: cannot parse '{formula}'"))?;
                check_for_undefined_identifiers(&Tree::from_ast(&node), &domains)
                    .with_context(|| format!("{section}: '{formula}'"))?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    EnvVars,
    SysVars,
    EnvInit,
    EnvSafety,
    EnvProg,
    SysInit,
    SysSafety,
    SysProg,
}

const SECTIONS: &[(&str, Section)] = &[
    ("ENV_VARS", Section::EnvVars),
    ("SYS_VARS", Section::SysVars),
    ("ENV_INIT", Section::EnvInit),
    ("ENV_SAFETY", Section::EnvSafety),
    ("ENV_PROG", Section::EnvProg),
    ("SYS_INIT", Section::SysInit),
    ("SYS_SAFETY", Section::SysSafety),
    ("SYS_PROG", Section::SysProg),
];

pub fn parse_spec_file(path: &Path) -> Result<SpecConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_spec_config(&raw).with_context(|| format!("in {}", path.display()))
}

pub fn parse_spec_config(input: &str) -> Result<SpecConfig> {
    let mut cfg = SpecConfig::default();
    let mut declared = BTreeSet::new();
    let mut section: Option<Section> = None;

    for (lineno, raw_line) in input.lines().enumerate() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        if let Some((keyword, rest)) = split_header(line) {
            section = Some(keyword);
            if rest.is_empty() {
                continue;
            }
            add_line(&mut cfg, &mut declared, keyword, rest)
                .with_context(|| format!("line {}", lineno + 1))?;
            continue;
        }

        match section {
            Some(current) => add_line(&mut cfg, &mut declared, current, line)
                .with_context(|| format!("line {}", lineno + 1))?,
            None => {
                bail!(
                    "line {}: unrecognized line outside section: {}",
                    lineno + 1,
                    line
                );
            }
        }
    }

    Ok(cfg)
}

/// Cut at the first `#` outside a string constant.
fn strip_comment(line: &str) -> &str {
    let mut quoted = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '#' if !quoted => return &line[..i],
            _ => {}
        }
    }
    line
}

/// `SYS_SAFETY` alone opens a section; `SYS_SAFETY <formula>` also adds one line.
fn split_header(line: &str) -> Option<(Section, &str)> {
    for (name, section) in SECTIONS {
        if let Some(rest) = line.strip_prefix(name)
            && (rest.is_empty() || rest.starts_with(char::is_whitespace))
        {
            return Some((*section, rest.trim()));
        }
    }
    None
}

fn add_line(
    cfg: &mut SpecConfig,
    declared: &mut BTreeSet<String>,
    section: Section,
    line: &str,
) -> Result<()> {
    match section {
        Section::EnvVars => declare(&mut cfg.env_vars, declared, line),
        Section::SysVars => declare(&mut cfg.sys_vars, declared, line),
        Section::EnvInit => push_formula(&mut cfg.env_init, line),
        Section::EnvSafety => push_formula(&mut cfg.env_safety, line),
        Section::EnvProg => push_formula(&mut cfg.env_prog, line),
        Section::SysInit => push_formula(&mut cfg.sys_init, line),
        Section::SysSafety => push_formula(&mut cfg.sys_safety, line),
        Section::SysProg => push_formula(&mut cfg.sys_prog, line),
    }
}

fn push_formula(out: &mut Vec<String>, line: &str) -> Result<()> {
    out.push(line.to_string());
    Ok(())
}

fn declare(vars: &mut Domains, declared: &mut BTreeSet<String>, line: &str) -> Result<()> {
    let (name, rhs) = line
        .split_once(':')
        .ok_or_else(|| anyhow!("invalid variable declaration: {}", line))?;
    let name = name.trim();
    if !is_name(name) {
        bail!("invalid variable name: {name:?}");
    }
    if !declared.insert(name.to_string()) {
        bail!("variable declared twice: {name}");
    }
    vars.insert(name.to_string(), parse_domain(rhs.trim())?);
    Ok(())
}

pub fn parse_domain(input: &str) -> Result<Domain> {
    let mut p = DomainParser::new(input);
    let domain = p.parse_domain()?;
    p.skip_ws();
    if !p.is_eof() {
        bail!("unexpected trailing domain content: {}", p.rest());
    }
    Ok(domain)
}

struct DomainParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> DomainParser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eat_token(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn parse_domain(&mut self) -> Result<Domain> {
        self.skip_ws();
        if self.eat_token("{") {
            return self.parse_enum();
        }
        if self.eat_token("boolean") || self.eat_token("bool") {
            return Ok(Domain::Boolean);
        }
        self.parse_range()
    }

    fn parse_range(&mut self) -> Result<Domain> {
        let min = self.parse_int()?;
        self.skip_ws();
        if !self.eat_token("..") {
            bail!("expected '..' in integer range at: {}", self.rest());
        }
        let max = self.parse_int()?;
        if min > max {
            bail!("empty integer range: {min}..{max}");
        }
        Ok(Domain::Int { min, max })
    }

    fn parse_int(&mut self) -> Result<i64> {
        self.skip_ws();
        let start = self.pos;
        if self.peek_char() == Some('-') {
            self.pos += 1;
        }
        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        let text = &self.src[start..self.pos];
        text.parse::<i64>()
            .map_err(|_| anyhow!("expected integer at: {}", &self.src[start..]))
    }

    fn parse_enum(&mut self) -> Result<Domain> {
        let mut items: Vec<String> = Vec::new();
        loop {
            self.skip_ws();
            if self.eat_token("}") {
                break;
            }
            let value = self.parse_value()?;
            if items.contains(&value) {
                bail!("duplicate value in domain: {value}");
            }
            items.push(value);
            self.skip_ws();
            if self.eat_token("}") {
                break;
            }
            if !self.eat_token(",") {
                bail!("expected ',' or '}}' in domain: {}", self.rest());
            }
        }
        if items.is_empty() {
            bail!("enumerated domain has no values");
        }
        Ok(Domain::Enum(items))
    }

    // Values have no escapes, matching string constants in formulas.
    fn parse_value(&mut self) -> Result<String> {
        let rest = self.rest();
        if let Some(body) = rest.strip_prefix('"') {
            let Some(len) = body.find('"') else {
                bail!("unterminated string literal: {rest}");
            };
            let value = body[..len].to_string();
            self.pos += len + 2;
            return Ok(value);
        }
        let len = rest
            .find(|c: char| c.is_whitespace() || c == ',' || c == '}')
            .unwrap_or(rest.len());
        let atom = &rest[..len];
        if atom.is_empty() {
            bail!("expected domain value at: {rest}");
        }
        if atom.contains('"') {
            bail!("stray quote in domain value: {atom}");
        }
        let atom = atom.to_string();
        self.pos += len;
        Ok(atom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAR: &str = r#"
        # parking example
        ENV_VARS
            park : boolean
        SYS_VARS
            loc : 0..29
            mode : {"idle", "busy"}
        ENV_PROG !park
        SYS_INIT
            loc = 0
        SYS_SAFETY
            park -> X(mode = "idle")
            loc' != 29
        SYS_PROG loc = 29
    "#;

    #[test]
    fn parses_sections_and_domains() {
        let cfg = parse_spec_config(CAR).expect("spec should parse");
        assert_eq!(cfg.env_vars.get("park"), Some(&Domain::Boolean));
        assert_eq!(
            cfg.sys_vars.get("loc"),
            Some(&Domain::Int { min: 0, max: 29 })
        );
        assert_eq!(
            cfg.sys_vars.get("mode"),
            Some(&Domain::Enum(vec!["idle".into(), "busy".into()]))
        );
        assert_eq!(cfg.env_prog, vec!["!park".to_string()]);
        assert_eq!(cfg.sys_safety.len(), 2);
        assert_eq!(cfg.sys_prog, vec!["loc = 29".to_string()]);
        assert_eq!(cfg.domains().len(), 3);
        cfg.check().expect("formulas match domains");
    }

    #[test]
    fn check_reports_section_and_formula() {
        let cfg = parse_spec_config(
            r#"
            SYS_VARS
                loc : 0..3
            SYS_SAFETY loc < 7
            "#,
        )
        .unwrap();
        let err = cfg.check().unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("SYS_SAFETY"), "{msg}");
        assert!(msg.contains("out of its range"), "{msg}");
    }

    #[test]
    fn rejects_duplicate_declaration() {
        let err = parse_spec_config(
            r#"
            ENV_VARS
                x : boolean
            SYS_VARS
                x : 0..1
            "#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("declared twice"));
    }

    #[test]
    fn rejects_names_that_lex_as_operators() {
        let err = parse_spec_config("SYS_VARS\n  Go : boolean").unwrap_err();
        assert!(format!("{err:#}").contains("invalid variable name"));
        assert!(parse_spec_config("SYS_VARS\n  G_o : boolean").is_ok());
    }

    #[test]
    fn rejects_lines_outside_sections() {
        assert!(parse_spec_config("x : boolean").is_err());
    }

    #[test]
    fn parses_domain_forms() {
        assert_eq!(parse_domain("bool").unwrap(), Domain::Boolean);
        assert_eq!(
            parse_domain("-2 .. 5").unwrap(),
            Domain::Int { min: -2, max: 5 }
        );
        assert_eq!(
            parse_domain("{a, \"b c\"}").unwrap(),
            Domain::Enum(vec!["a".into(), "b c".into()])
        );
        assert!(parse_domain("3..1").is_err());
        assert!(parse_domain("{}").is_err());
        assert!(parse_domain("{a, a}").is_err());
        assert!(parse_domain("0..1 extra").is_err());
    }

    #[test]
    fn domain_display_reparses() {
        let dom = Domain::Enum(vec!["on".into(), "off".into()]);
        assert_eq!(dom.to_string(), "{\"on\", \"off\"}");
        assert_eq!(parse_domain(&dom.to_string()).unwrap(), dom);
    }

    #[test]
    fn enum_values_keep_hash_and_backslash() {
        let cfg = parse_spec_config(
            "SYS_VARS\n  tag : {\"a#b\", \"c\\d\"} # trailing comment\nSYS_INIT tag = \"a#b\"",
        )
        .unwrap();
        let dom = &cfg.sys_vars["tag"];
        assert_eq!(dom, &Domain::Enum(vec!["a#b".into(), "c\\d".into()]));
        assert_eq!(parse_domain(&dom.to_string()).unwrap(), *dom);
        assert_eq!(cfg.sys_init, vec!["tag = \"a#b\"".to_string()]);
        cfg.check().unwrap();
    }

    #[test]
    fn rejects_quotes_inside_values() {
        assert!(parse_domain("{\"a\\\"b\"}").is_err());
        assert!(parse_domain("{a\"b}").is_err());
        assert!(parse_domain("{\"open}").is_err());
    }

    #[test]
    fn reads_spec_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("car.spec");
        std::fs::write(&path, CAR).unwrap();
        let cfg = parse_spec_file(&path).unwrap();
        assert_eq!(cfg.sys_init, vec!["loc = 0".to_string()]);
    }
}
