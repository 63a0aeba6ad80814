use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    /// X p - p holds in the next step
    Next,
    /// G p / [] p
    Always,
    /// F p / <> p
    Eventually,
}

impl UnaryOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Next => "X",
            UnaryOp::Always => "G",
            UnaryOp::Eventually => "F",
        }
    }

    pub const fn is_temporal(self) -> bool {
        !matches!(self, UnaryOp::Not)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    And,
    Or,
    Xor,
    Imp,
    BiImp,
    Until,
    Release,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Imp => "->",
            BinaryOp::BiImp => "<->",
            BinaryOp::Until => "U",
            BinaryOp::Release => "R",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }

    pub const fn is_comparator(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub const fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        )
    }

    pub const fn is_temporal(self) -> bool {
        matches!(self, BinaryOp::Until | BinaryOp::Release)
    }
}

/// Recursive syntax tree of a TuLiP LTL formula.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Node {
    Var(String),
    /// Quoted string constant, a value of an enumerated variable
    Str(String),
    Num(i64),
    Bool(bool),
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn unary(op: UnaryOp, operand: Node) -> Self {
        Node::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, left: Node, right: Node) -> Self {
        Node::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Node::Var(name.into())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Node::Var(_) | Node::Str(_) | Node::Num(_) | Node::Bool(_)
        )
    }

    /// Names of all variables occurring in the formula.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut BTreeSet<String>) {
        match self {
            Node::Var(name) => {
                out.insert(name.clone());
            }
            Node::Str(_) | Node::Num(_) | Node::Bool(_) => {}
            Node::Unary { operand, .. } => operand.collect_variables(out),
            Node::Binary { left, right, .. } => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
        }
    }

    /// True if any temporal operator occurs in the formula.
    pub fn is_temporal(&self) -> bool {
        match self {
            Node::Unary { op, operand } => op.is_temporal() || operand.is_temporal(),
            Node::Binary { op, left, right } => {
                op.is_temporal() || left.is_temporal() || right.is_temporal()
            }
            _ => false,
        }
    }
}

/// Fully parenthesized, so the output parses back to the same tree.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Var(name) => f.write_str(name),
            Node::Str(value) => write!(f, "\"{value}\""),
            Node::Num(n) => write!(f, "{n}"),
            Node::Bool(true) => f.write_str("TRUE"),
            Node::Bool(false) => f.write_str("FALSE"),
            Node::Unary { op, operand } => write!(f, "({} {})", op.symbol(), operand),
            Node::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
        }
    }
}
