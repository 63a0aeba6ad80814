use super::ast::{BinaryOp, Node, UnaryOp};
use super::error::ParseError;
use super::lexer::{Token, TokenKind, tokenize};

/// Parse a formula in TuLiP LTL syntax.
///
/// Binding, from loosest to tightest:
/// 1. `U`, `R` (right)
/// 2. `<->` (right), then `->` (right)
/// 3. `^`, `|`, `&` (left)
/// 4. prefix `G F [] <>`, then `X next`, then `!`
/// 5. comparators `= != < <= > >=` (non-associative)
/// 6. `+ -`, then `* /` (left)
///
/// A postfix `'` means next of the name, constant or parenthesized group
/// it follows, so `x = y'` compares `x` now with `y` in the next step.
///
/// Formulas nested deeper than [`MAX_DEPTH`] are rejected.
pub fn parse(formula: &str) -> Result<Node, ParseError> {
    let tokens = tokenize(formula)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        nesting: 0,
    };
    let (node, _) = parser.parse_expr(0)?;
    if let Some(tok) = parser.peek() {
        return Err(ParseError::UnexpectedToken {
            found: tok.kind.to_string(),
            offset: tok.offset,
            expected: "end of formula",
        });
    }
    tracing::debug!(formula, parsed = %node, "parsed formula");
    Ok(node)
}

/// Height limit of a parsed syntax tree.
pub const MAX_DEPTH: usize = 256;

// Parentheses cost a level of recursion each, so a fully parenthesized
// rendering of a tree of height MAX_DEPTH needs up to twice as many.
const MAX_NESTING: usize = 2 * MAX_DEPTH + 2;

const COMPARATOR_BP: u8 = 11;

#[derive(Debug, Clone, Copy)]
enum Assoc {
    Left,
    Right,
    NonAssoc,
}

fn infix_op(kind: &TokenKind) -> Option<(BinaryOp, u8, Assoc)> {
    let entry = match kind {
        TokenKind::Until => (BinaryOp::Until, 1, Assoc::Right),
        TokenKind::Release => (BinaryOp::Release, 1, Assoc::Right),
        TokenKind::BiImp => (BinaryOp::BiImp, 2, Assoc::Right),
        TokenKind::Imp => (BinaryOp::Imp, 3, Assoc::Right),
        TokenKind::Xor => (BinaryOp::Xor, 4, Assoc::Left),
        TokenKind::Or => (BinaryOp::Or, 5, Assoc::Left),
        TokenKind::And => (BinaryOp::And, 6, Assoc::Left),
        TokenKind::Eq => (BinaryOp::Eq, COMPARATOR_BP, Assoc::NonAssoc),
        TokenKind::Ne => (BinaryOp::Ne, COMPARATOR_BP, Assoc::NonAssoc),
        TokenKind::Lt => (BinaryOp::Lt, COMPARATOR_BP, Assoc::NonAssoc),
        TokenKind::Le => (BinaryOp::Le, COMPARATOR_BP, Assoc::NonAssoc),
        TokenKind::Gt => (BinaryOp::Gt, COMPARATOR_BP, Assoc::NonAssoc),
        TokenKind::Ge => (BinaryOp::Ge, COMPARATOR_BP, Assoc::NonAssoc),
        TokenKind::Plus => (BinaryOp::Add, 12, Assoc::Left),
        TokenKind::Minus => (BinaryOp::Sub, 12, Assoc::Left),
        TokenKind::Times => (BinaryOp::Mul, 13, Assoc::Left),
        TokenKind::Div => (BinaryOp::Div, 13, Assoc::Left),
        _ => return None,
    };
    Some(entry)
}

fn prefix_op(kind: &TokenKind) -> Option<(UnaryOp, u8)> {
    match kind {
        TokenKind::Always => Some((UnaryOp::Always, 7)),
        TokenKind::Eventually => Some((UnaryOp::Eventually, 7)),
        TokenKind::Next => Some((UnaryOp::Next, 8)),
        TokenKind::Not => Some((UnaryOp::Not, 9)),
        _ => None,
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    nesting: usize,
}

/// A parsed subformula and the height of its tree.
type Parsed = (Node, usize);

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Offset of the next token, or of the last one at the end.
    fn offset(&self) -> usize {
        self.peek()
            .or(self.tokens.last())
            .map_or(0, |tok| tok.offset)
    }

    fn check_height(&self, height: usize, offset: usize) -> Result<(), ParseError> {
        if height > MAX_DEPTH {
            return Err(ParseError::TooDeep {
                offset,
                limit: MAX_DEPTH,
            });
        }
        Ok(())
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Parsed, ParseError> {
        if self.nesting >= MAX_NESTING {
            return Err(ParseError::TooDeep {
                offset: self.offset(),
                limit: MAX_DEPTH,
            });
        }
        self.nesting += 1;
        let out = self.parse_infix(min_bp);
        self.nesting -= 1;
        out
    }

    fn parse_infix(&mut self, min_bp: u8) -> Result<Parsed, ParseError> {
        let (mut lhs, mut height) = self.parse_prefix()?;
        // Set when `lhs` is a comparison built in this loop.
        let mut compared = false;

        loop {
            let Some(tok) = self.peek() else {
                break;
            };
            let Some((op, bp, assoc)) = infix_op(&tok.kind) else {
                break;
            };
            let (left_bp, right_bp) = match assoc {
                Assoc::Right => (bp * 2 + 1, bp * 2),
                Assoc::Left | Assoc::NonAssoc => (bp * 2, bp * 2 + 1),
            };
            if left_bp < min_bp {
                break;
            }
            let offset = tok.offset;
            if op.is_comparator() && compared {
                return Err(ParseError::ChainedComparison { offset });
            }
            self.pos += 1;

            let (rhs, rhs_height) = self.parse_expr(right_bp)?;
            height = height.max(rhs_height) + 1;
            self.check_height(height, offset)?;
            lhs = Node::binary(op, lhs, rhs);
            compared = op.is_comparator();
        }

        Ok((lhs, height))
    }

    fn parse_prefix(&mut self) -> Result<Parsed, ParseError> {
        let Some(tok) = self.advance() else {
            return Err(ParseError::UnexpectedEnd {
                expected: "an expression",
            });
        };

        if let Some((op, bp)) = prefix_op(&tok.kind) {
            let (operand, height) = self.parse_expr(bp * 2)?;
            self.check_height(height + 1, tok.offset)?;
            return Ok((Node::unary(op, operand), height + 1));
        }

        let (mut node, mut height) = self.parse_primary(tok)?;
        while let Some(prime) = self.peek().filter(|t| t.kind == TokenKind::Prime) {
            height += 1;
            self.check_height(height, prime.offset)?;
            self.pos += 1;
            node = Node::unary(UnaryOp::Next, node);
        }
        Ok((node, height))
    }

    fn parse_primary(&mut self, tok: Token) -> Result<Parsed, ParseError> {
        let leaf = match tok.kind {
            TokenKind::True => Node::Bool(true),
            TokenKind::False => Node::Bool(false),
            TokenKind::Name(name) => Node::Var(name),
            TokenKind::Number(n) => Node::Num(n),
            TokenKind::Str(s) => Node::Str(s),
            TokenKind::LParen => {
                let inner = self.parse_expr(0)?;
                return match self.advance() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(ParseError::UnexpectedToken {
                        found: other.kind.to_string(),
                        offset: other.offset,
                        expected: "')'",
                    }),
                    None => Err(ParseError::UnexpectedEnd { expected: "')'" }),
                };
            }
            other => {
                return Err(ParseError::UnexpectedToken {
                    found: other.to_string(),
                    offset: tok.offset,
                    expected: "an expression",
                });
            }
        };
        Ok((leaf, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Node {
        Node::var(name)
    }

    #[test]
    fn parses_demo_formula() {
        let node = parse("up && !(loc = 29) && X((u_in = 0) || (u_in = 2))").unwrap();
        assert_eq!(
            node.to_string(),
            "((up & (! (loc = 29))) & (X ((u_in = 0) | (u_in = 2))))"
        );
    }

    #[test]
    fn conjunction_binds_tighter_than_disjunction() {
        let node = parse("a | b & c").unwrap();
        assert_eq!(
            node,
            Node::binary(
                BinaryOp::Or,
                var("a"),
                Node::binary(BinaryOp::And, var("b"), var("c"))
            )
        );
    }

    #[test]
    fn implication_is_right_associative() {
        let node = parse("a -> b -> c").unwrap();
        assert_eq!(node.to_string(), "(a -> (b -> c))");
        let node = parse("a <-> b -> c").unwrap();
        assert_eq!(node.to_string(), "(a <-> (b -> c))");
    }

    #[test]
    fn until_is_loosest() {
        let node = parse("a & b U c | d").unwrap();
        assert_eq!(node.to_string(), "((a & b) U (c | d))");
        let node = parse("a U b R c").unwrap();
        assert_eq!(node.to_string(), "(a U (b R c))");
    }

    #[test]
    fn temporal_prefix_binds_tighter_than_and() {
        assert_eq!(parse("G p & q").unwrap().to_string(), "((G p) & q)");
        assert_eq!(parse("[]<> p").unwrap().to_string(), "(G (F p))");
        assert_eq!(parse("GF p -> q").unwrap().to_string(), "((G (F p)) -> q)");
    }

    #[test]
    fn negation_covers_comparison() {
        assert_eq!(parse("! x = 3").unwrap().to_string(), "(! (x = 3))");
        assert_eq!(parse("next x >= 3").unwrap().to_string(), "(X (x >= 3))");
    }

    #[test]
    fn prime_means_next() {
        assert_eq!(parse("x' = 2").unwrap().to_string(), "((X x) = 2)");
        assert_eq!(parse("!p'").unwrap().to_string(), "(! (X p))");
    }

    #[test]
    fn prime_applies_to_the_operand_it_follows() {
        assert_eq!(parse("x = y'").unwrap().to_string(), "(x = (X y))");
        assert_eq!(parse("x' = y'").unwrap().to_string(), "((X x) = (X y))");
        assert_eq!(parse("loc = loc'").unwrap().to_string(), "(loc = (X loc))");
        assert_eq!(
            parse("(a & b)' | c").unwrap().to_string(),
            "((X (a & b)) | c)"
        );
        assert_eq!(parse("x + y' < 3").unwrap().to_string(), "((x + (X y)) < 3)");
    }

    #[test]
    fn rejects_formulas_nested_too_deep() {
        let deep_not = format!("{}p", "!".repeat(30_000));
        assert!(matches!(
            parse(&deep_not),
            Err(ParseError::TooDeep { limit: MAX_DEPTH, .. })
        ));

        let deep_parens = format!("{}p{}", "(".repeat(30_000), ")".repeat(30_000));
        assert!(matches!(
            parse(&deep_parens),
            Err(ParseError::TooDeep { .. })
        ));

        let long_chain = vec!["a"; 30_000].join(" & ");
        assert!(matches!(
            parse(&long_chain),
            Err(ParseError::TooDeep { .. })
        ));

        let long_implication = vec!["a"; 30_000].join(" -> ");
        assert!(matches!(
            parse(&long_implication),
            Err(ParseError::TooDeep { .. })
        ));
    }

    #[test]
    fn deepest_accepted_formula_reparses() {
        let node = parse(&format!("{}p", "!".repeat(MAX_DEPTH - 1))).unwrap();
        assert_eq!(parse(&node.to_string()).unwrap(), node);
        assert!(parse(&format!("{}p", "!".repeat(MAX_DEPTH))).is_err());
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(
            parse("x + 2 * y < 10 - z").unwrap().to_string(),
            "((x + (2 * y)) < (10 - z))"
        );
        assert_eq!(parse("a - b - c").unwrap().to_string(), "((a - b) - c)");
    }

    #[test]
    fn parses_constants() {
        assert_eq!(
            parse("mode = \"idle\" | TRUE").unwrap(),
            Node::binary(
                BinaryOp::Or,
                Node::binary(BinaryOp::Eq, var("mode"), Node::Str("idle".into())),
                Node::Bool(true)
            )
        );
    }

    #[test]
    fn display_round_trips() {
        let inputs = [
            "[](req -> <>grant)",
            "a ^ b ^ c",
            "X(x' = 1) U y != \"off\"",
        ];
        for input in inputs {
            let first = parse(input).unwrap();
            let second = parse(&first.to_string()).unwrap();
            assert_eq!(first, second, "round trip of {input}");
        }
    }

    #[test]
    fn rejects_chained_comparison() {
        assert!(matches!(
            parse("a = b = c"),
            Err(ParseError::ChainedComparison { offset: 6 })
        ));
        assert!(parse("(a = b) = c").is_ok());
    }

    #[test]
    fn reports_syntax_errors() {
        assert!(matches!(
            parse("a &"),
            Err(ParseError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse("(a | b"),
            Err(ParseError::UnexpectedEnd { expected: "')'" })
        ));
        assert!(matches!(
            parse("a b"),
            Err(ParseError::UnexpectedToken {
                expected: "end of formula",
                ..
            })
        ));
        assert!(matches!(
            parse("& a"),
            Err(ParseError::UnexpectedToken { offset: 0, .. })
        ));
    }
}
