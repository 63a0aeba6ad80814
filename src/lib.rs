pub mod guide;
pub mod spec;

pub use spec::{Node, ParseError, SpecConfig, Tree, parse, parse_spec_file};
