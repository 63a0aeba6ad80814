pub mod ast;
pub mod domain;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod transformation;
pub mod translation;
pub mod tree;

pub use ast::{BinaryOp, Node, UnaryOp};
pub use domain::{Domain, Domains, SpecConfig, parse_domain, parse_spec_config, parse_spec_file};
pub use error::{ParseError, TransformError, TranslateError};
pub use lexer::{Token, TokenKind, is_name, tokenize};
pub use parser::{MAX_DEPTH, parse};
pub use transformation::{
    KnownVariables, Value, check_for_undefined_identifiers, check_var_name_conflict,
    infer_constants, pair_node_to_var, sub_bool_with_subtree, sub_constants, sub_values,
};
pub use translation::{spec_to_gr1c, to_gr1c};
pub use tree::{Label, NodeId, Tree};
