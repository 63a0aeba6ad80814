#![no_main]

use libfuzzer_sys::fuzz_target;
use tulip_ltl::spec::{Tree, parse, to_gr1c};

fuzz_target!(|data: &[u8]| {
    // Anything that parses must survive the tree round trip and reparse
    // from its rendering.
    if let Ok(input) = std::str::from_utf8(data)
        && let Ok(node) = parse(input)
    {
        let tree = Tree::from_ast(&node);
        assert_eq!(tree.to_ast().ok().as_ref(), Some(&node));
        assert_eq!(parse(&node.to_string()).ok().as_ref(), Some(&node));
        let _ = to_gr1c(&node);
    }
});
