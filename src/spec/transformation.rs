//! Syntactic rewriting of formula trees against variable domains.

use super::domain::{Domain, Domains};
use super::error::TransformError;
use super::parser::parse;
use super::tree::{Label, NodeId, Tree};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Value assigned to a variable by [`sub_values`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<&Value> for Label {
    fn from(value: &Value) -> Self {
        match value {
            Value::Bool(b) => Label::Bool(*b),
            Value::Int(n) => Label::Num(*n),
            Value::Str(s) => Label::Str(s.clone()),
        }
    }
}

/// What [`infer_constants`] knows about the variables of a formula.
#[derive(Debug, Clone, Copy)]
pub enum KnownVariables<'a> {
    Domains(&'a Domains),
    /// Names only; value clashes cannot be detected.
    Names(&'a BTreeSet<String>),
}

impl KnownVariables<'_> {
    fn contains(&self, name: &str) -> bool {
        match self {
            KnownVariables::Domains(domains) => domains.contains_key(name),
            KnownVariables::Names(names) => names.contains(name),
        }
    }
}

fn ids_where(tree: &Tree, pred: impl Fn(&Label) -> bool) -> Vec<NodeId> {
    tree.node_ids()
        .filter(|id| tree.label(*id).is_ok_and(&pred))
        .collect()
}

fn var_name(tree: &Tree, id: NodeId) -> Result<String, TransformError> {
    match tree.label(id)? {
        Label::Var(name) => Ok(name.clone()),
        other => Err(TransformError::NoPairedVariable {
            constant: other.to_string(),
            operator: String::new(),
        }),
    }
}

/// Fail if `tree` uses a variable missing from `domains`, or compares a
/// variable with a constant outside its domain.
pub fn check_for_undefined_identifiers(
    tree: &Tree,
    domains: &Domains,
) -> Result<(), TransformError> {
    for id in tree.node_ids() {
        if let Label::Var(name) = tree.label(id)?
            && !domains.contains_key(name)
        {
            return Err(TransformError::UndefinedVariable {
                var: name.clone(),
                formula: tree.to_string(),
            });
        }
    }

    for id in tree.node_ids() {
        let label = tree.label(id)?;
        if !matches!(label, Label::Str(_) | Label::Num(_)) {
            continue;
        }
        let (var_id, _) = pair_node_to_var(tree, id)?;
        let var = var_name(tree, var_id)?;
        let Some(domain) = domains.get(&var) else {
            return Err(TransformError::UndefinedVariable {
                var,
                formula: tree.to_string(),
            });
        };

        match (label, domain) {
            (Label::Str(value), Domain::Enum(values)) => {
                if !values.contains(value) {
                    return Err(TransformError::StringNotInDomain {
                        constant: label.to_string(),
                        var,
                    });
                }
            }
            (Label::Str(_), _) => {
                return Err(TransformError::StringForNonEnum {
                    constant: label.to_string(),
                    var,
                    domain: domain.to_string(),
                });
            }
            (Label::Num(value), Domain::Int { min, max }) => {
                if !(*min..=*max).contains(value) {
                    return Err(TransformError::NumberOutOfRange {
                        var,
                        value: *value,
                        min: *min,
                        max: *max,
                    });
                }
            }
            (Label::Num(value), _) => {
                return Err(TransformError::NumberForNonInteger {
                    value: *value,
                    var,
                    domain: domain.to_string(),
                });
            }
            _ => {}
        }
    }
    Ok(())
}

/// Find the variable a constant is compared with.
///
/// Climbs from `id` to the first binary operator, then descends the other
/// operand along first children until a variable. Only unary operators may
/// sit between the binary operator and the variable for this to find the
/// intended pairing. Returns `(variable, operator)`.
pub fn pair_node_to_var(tree: &Tree, id: NodeId) -> Result<(NodeId, NodeId), TransformError> {
    let constant = tree.label(id)?.to_string();
    let mut child = id;
    let op = loop {
        let parent = tree
            .parent(child)?
            .ok_or_else(|| TransformError::NoBinaryParent {
                constant: constant.clone(),
            })?;
        if matches!(tree.label(parent)?, Label::Binary(_)) {
            break parent;
        }
        child = parent;
    };

    let operands = tree.children(op)?;
    let mut v = match operands {
        [left, right] if *left == child => *right,
        [left, _] => *left,
        _ => {
            return Err(TransformError::NoPairedVariable {
                constant,
                operator: tree.label(op)?.to_string(),
            });
        }
    };
    loop {
        if matches!(tree.label(v)?, Label::Var(_)) {
            return Ok((v, op));
        }
        v = match tree.children(v)?.first() {
            Some(first) => *first,
            None => {
                return Err(TransformError::NoPairedVariable {
                    constant,
                    operator: tree.label(op)?.to_string(),
                });
            }
        };
    }
}

/// Replace every variable by its value.
pub fn sub_values(tree: &mut Tree, values: &BTreeMap<String, Value>) -> Result<(), TransformError> {
    for id in ids_where(tree, |l| matches!(l, Label::Var(_))) {
        let name = var_name(tree, id)?;
        let value = values
            .get(&name)
            .ok_or(TransformError::MissingValue(name))?;
        tree.relabel(id, value.into())?;
    }
    Ok(())
}

/// Replace string constants by their index in the paired variable's list,
/// turning enumerated variables into integer ones.
pub fn sub_constants(
    tree: &mut Tree,
    var_str2int: &BTreeMap<String, Vec<String>>,
) -> Result<(), TransformError> {
    for id in ids_where(tree, |l| matches!(l, Label::Str(_))) {
        let (var_id, _) = pair_node_to_var(tree, id)?;
        let var = var_name(tree, var_id)?;
        let values = var_str2int
            .get(&var)
            .ok_or_else(|| TransformError::MissingConstants(var.clone()))?;
        let Label::Str(value) = tree.label(id)? else {
            continue;
        };
        let index = values
            .iter()
            .position(|v| v == value)
            .ok_or_else(|| TransformError::StringNotInDomain {
                constant: format!("\"{value}\""),
                var: var.clone(),
            })?;
        tree.relabel(id, Label::Num(index as i64))?;
    }
    Ok(())
}

/// Replace the named Boolean variables by copies of the given trees.
pub fn sub_bool_with_subtree(
    tree: &mut Tree,
    bool2subtree: &BTreeMap<String, Tree>,
) -> Result<(), TransformError> {
    let targets = ids_where(
        tree,
        |l| matches!(l, Label::Var(name) if bool2subtree.contains_key(name)),
    );
    for id in targets {
        let name = var_name(tree, id)?;
        if let Some(subtree) = bool2subtree.get(&name) {
            tree.add_subtree(id, subtree)?;
        }
    }
    Ok(())
}

/// Quote every name in `formula` that is not a variable.
///
/// With domains, fails if a variable name is also a value of some
/// enumerated domain, since the result would be ambiguous.
pub fn infer_constants(
    formula: &str,
    variables: KnownVariables<'_>,
) -> Result<String, TransformError> {
    match variables {
        KnownVariables::Domains(domains) => {
            let names: BTreeSet<String> = domains.keys().cloned().collect();
            check_value_conflicts(&names, domains)?;
        }
        KnownVariables::Names(_) => {
            tracing::warn!(
                formula,
                "inferring constants without variable domains; \
                 clashes between variable names and values go unnoticed"
            );
        }
    }

    let mut tree = Tree::from_ast(&parse(formula)?);
    let constants: Vec<NodeId> = ids_where(
        &tree,
        |l| matches!(l, Label::Var(name) if !variables.contains(name)),
    );
    for id in constants {
        let name = var_name(&tree, id)?;
        tree.relabel(id, Label::Str(name))?;
    }
    Ok(tree.to_string())
}

fn check_value_conflicts(names: &BTreeSet<String>, domains: &Domains) -> Result<(), TransformError> {
    let mut clashes: BTreeSet<String> = BTreeSet::new();
    for domain in domains.values() {
        if let Domain::Enum(values) = domain {
            clashes.extend(values.iter().filter(|v| names.contains(*v)).cloned());
        }
    }
    if clashes.is_empty() {
        Ok(())
    } else {
        Err(TransformError::ValuesRedefined(clashes.into_iter().collect()))
    }
}

/// Fail if `varname` already occurs as a variable in `formula`; otherwise
/// return the formula's variables.
pub fn check_var_name_conflict(
    formula: &str,
    varname: &str,
) -> Result<BTreeSet<String>, TransformError> {
    let vars = Tree::from_ast(&parse(formula)?).variables();
    if vars.contains(varname) {
        return Err(TransformError::VarNameConflict(varname.to_string()));
    }
    Ok(vars)
}
