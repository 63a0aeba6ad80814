use thiserror::Error;

/// Lexing and parsing failures. Offsets are byte offsets into the formula.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("illegal character '{ch}' at line {line}, offset {offset}")]
    IllegalCharacter { ch: char, line: usize, offset: usize },
    #[error("unterminated string constant starting at offset {offset}")]
    UnterminatedString { offset: usize },
    #[error("number '{text}' at offset {offset} does not fit in 64 bits")]
    NumberOverflow { text: String, offset: usize },
    #[error("syntax error at '{found}' (offset {offset}): expected {expected}")]
    UnexpectedToken {
        found: String,
        offset: usize,
        expected: &'static str,
    },
    #[error("unexpected end of formula: expected {expected}")]
    UnexpectedEnd { expected: &'static str },
    #[error("comparison operators cannot be chained (offset {offset})")]
    ChainedComparison { offset: usize },
    #[error("formula nested deeper than {limit} levels (offset {offset})")]
    TooDeep { offset: usize, limit: usize },
}

/// Failures of the syntactic transformations on [`crate::spec::Tree`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("tree is empty")]
    EmptyTree,
    #[error("no node with id {0}")]
    UnknownNode(usize),
    #[error("node {0} is not a leaf")]
    NotALeaf(usize),
    #[error("cannot relabel node {id}: {reason}")]
    BadRelabel { id: usize, reason: &'static str },
    #[error("undefined variable: {var}, in subformula:\n\t{formula}")]
    UndefinedVariable { var: String, formula: String },
    #[error("constant {constant} is not an operand of a binary operator")]
    NoBinaryParent { constant: String },
    #[error("no variable paired with constant {constant} under operator {operator}")]
    NoPairedVariable { constant: String, operator: String },
    #[error(
        "string constant: {constant}, assigned to non-string variable: {var}, whose domain is:\n\t{domain}"
    )]
    StringForNonEnum {
        constant: String,
        var: String,
        domain: String,
    },
    #[error("string constant: {constant}, is not in the domain of variable: {var}")]
    StringNotInDomain { constant: String, var: String },
    #[error(
        "number: {value}, assigned to non-integer variable: {var}, whose domain is:\n\t{domain}"
    )]
    NumberForNonInteger {
        value: i64,
        var: String,
        domain: String,
    },
    #[error(
        "integer variable: {var}, is assigned the value: {value}, that is out of its range: {min} ... {max}"
    )]
    NumberOutOfRange {
        var: String,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("no value given for variable: {0}")]
    MissingValue(String),
    #[error("no constant list given for variable: {0}")]
    MissingConstants(String),
    #[error("values redefined: {0:?}")]
    ValuesRedefined(Vec<String>),
    #[error("var name \"{0}\" already used")]
    VarNameConflict(String),
}

/// Constructs a target syntax cannot express.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("{target} has no {construct} operator, in subformula: {formula}")]
    Unsupported {
        target: &'static str,
        construct: &'static str,
        formula: String,
    },
    #[error("{target} supports only one step of next, in subformula: {formula}")]
    NestedNext {
        target: &'static str,
        formula: String,
    },
}
