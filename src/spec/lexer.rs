use super::error::ParseError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    True,
    False,
    Name(String),
    Number(i64),
    Str(String),
    Not,
    And,
    Or,
    Xor,
    Imp,
    BiImp,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Prime,
    Always,
    Eventually,
    Next,
    Until,
    Release,
    Plus,
    Minus,
    Times,
    Div,
    LParen,
    RParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::True => f.write_str("TRUE"),
            TokenKind::False => f.write_str("FALSE"),
            TokenKind::Name(name) => f.write_str(name),
            TokenKind::Number(n) => write!(f, "{n}"),
            TokenKind::Str(s) => write!(f, "\"{s}\""),
            TokenKind::Not => f.write_str("!"),
            TokenKind::And => f.write_str("&"),
            TokenKind::Or => f.write_str("|"),
            TokenKind::Xor => f.write_str("^"),
            TokenKind::Imp => f.write_str("->"),
            TokenKind::BiImp => f.write_str("<->"),
            TokenKind::Eq => f.write_str("="),
            TokenKind::Ne => f.write_str("!="),
            TokenKind::Lt => f.write_str("<"),
            TokenKind::Le => f.write_str("<="),
            TokenKind::Gt => f.write_str(">"),
            TokenKind::Ge => f.write_str(">="),
            TokenKind::Prime => f.write_str("'"),
            TokenKind::Always => f.write_str("[]"),
            TokenKind::Eventually => f.write_str("<>"),
            TokenKind::Next => f.write_str("X"),
            TokenKind::Until => f.write_str("U"),
            TokenKind::Release => f.write_str("R"),
            TokenKind::Plus => f.write_str("+"),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Times => f.write_str("*"),
            TokenKind::Div => f.write_str("/"),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
    pub line: usize,
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer::new(input);
    let mut out = Vec::new();
    while let Some(token) = lexer.next_token()? {
        out.push(token);
    }
    Ok(out)
}

/// True if `text` lexes as exactly one name token, so it can be used as a
/// variable in formulas.
pub fn is_name(text: &str) -> bool {
    match tokenize(text).as_deref() {
        Ok(
            [
                Token {
                    kind: TokenKind::Name(name),
                    ..
                },
            ],
        ) => name == text,
        _ => false,
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':')
}

/// Single letters that are operators: `F G R U X`.
fn letter_operator(c: char) -> Option<TokenKind> {
    match c {
        'F' => Some(TokenKind::Eventually),
        'G' => Some(TokenKind::Always),
        'R' => Some(TokenKind::Release),
        'U' => Some(TokenKind::Until),
        'X' => Some(TokenKind::Next),
        _ => None,
    }
}

fn keyword(word: &str) -> Option<TokenKind> {
    match word {
        "TRUE" | "True" | "true" => Some(TokenKind::True),
        "FALSE" | "False" | "false" => Some(TokenKind::False),
        "next" => Some(TokenKind::Next),
        _ => None,
    }
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek_char() {
            match c {
                ' ' | '\t' | '\r' => self.pos += 1,
                '\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                _ => break,
            }
        }
    }

    fn token(&self, kind: TokenKind, offset: usize) -> Token {
        Token {
            kind,
            offset,
            line: self.line,
        }
    }

    /// Longest match among fixed symbols, tried in order.
    fn eat_symbol(&mut self) -> Option<TokenKind> {
        const SYMBOLS: &[(&str, TokenKind)] = &[
            ("<->", TokenKind::BiImp),
            ("->", TokenKind::Imp),
            ("<>", TokenKind::Eventually),
            ("<=", TokenKind::Le),
            (">=", TokenKind::Ge),
            ("[]", TokenKind::Always),
            ("!=", TokenKind::Ne),
            ("==", TokenKind::Eq),
            ("&&", TokenKind::And),
            ("||", TokenKind::Or),
            ("<", TokenKind::Lt),
            (">", TokenKind::Gt),
            ("=", TokenKind::Eq),
            ("!", TokenKind::Not),
            ("&", TokenKind::And),
            ("|", TokenKind::Or),
            ("^", TokenKind::Xor),
            ("'", TokenKind::Prime),
            ("+", TokenKind::Plus),
            ("-", TokenKind::Minus),
            ("*", TokenKind::Times),
            ("/", TokenKind::Div),
            ("(", TokenKind::LParen),
            (")", TokenKind::RParen),
        ];
        let rest = self.rest();
        for (text, kind) in SYMBOLS {
            if rest.starts_with(text) {
                self.pos += text.len();
                return Some(kind.clone());
            }
        }
        None
    }

    fn next_token(&mut self) -> Result<Option<Token>, ParseError> {
        self.skip_ws();
        let start = self.pos;
        let Some(c) = self.peek_char() else {
            return Ok(None);
        };

        if c == '"' {
            return self.lex_string(start).map(Some);
        }
        if c.is_ascii_digit() {
            return self.lex_number(start).map(Some);
        }
        if is_name_start(c) {
            return Ok(Some(self.lex_word(start)));
        }
        if let Some(kind) = self.eat_symbol() {
            return Ok(Some(self.token(kind, start)));
        }

        Err(ParseError::IllegalCharacter {
            ch: c,
            line: self.line,
            offset: start,
        })
    }

    fn lex_string(&mut self, start: usize) -> Result<Token, ParseError> {
        self.pos += 1;
        let body_start = self.pos;
        while let Some(c) = self.peek_char() {
            if c == '"' {
                let body = self.src[body_start..self.pos].to_string();
                self.pos += 1;
                return Ok(self.token(TokenKind::Str(body), start));
            }
            if c == '\n' {
                break;
            }
            self.pos += c.len_utf8();
        }
        Err(ParseError::UnterminatedString { offset: start })
    }

    fn lex_number(&mut self, start: usize) -> Result<Token, ParseError> {
        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        let text = &self.src[start..self.pos];
        let value = text
            .parse::<i64>()
            .map_err(|_| ParseError::NumberOverflow {
                text: text.to_string(),
                offset: start,
            })?;
        Ok(self.token(TokenKind::Number(value), start))
    }

    fn lex_word(&mut self, start: usize) -> Token {
        let word_len = self
            .rest()
            .find(|c: char| !is_name_char(c))
            .unwrap_or(self.rest().len());
        let word = &self.src[start..start + word_len];

        if let Some(kind) = keyword(word) {
            self.pos += word_len;
            return self.token(kind, start);
        }

        // `Gp` is `G p`, but `G_1` and `X2` are names.
        if let Some(first) = word.chars().next()
            && let Some(op) = letter_operator(first)
        {
            let second = self.peek_second();
            let splits = word_len == 1 || matches!(second, Some(c) if c.is_ascii_alphabetic());
            if splits {
                self.pos += 1;
                return self.token(op, start);
            }
        }

        self.pos += word_len;
        self.token(TokenKind::Name(word.to_string()), start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .expect("input should lex")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_operators_longest_first() {
        assert_eq!(
            kinds("a <-> b -> c <> d <= 1 != 2"),
            vec![
                TokenKind::Name("a".into()),
                TokenKind::BiImp,
                TokenKind::Name("b".into()),
                TokenKind::Imp,
                TokenKind::Name("c".into()),
                TokenKind::Eventually,
                TokenKind::Name("d".into()),
                TokenKind::Le,
                TokenKind::Number(1),
                TokenKind::Ne,
                TokenKind::Number(2),
            ]
        );
    }

    #[test]
    fn splits_leading_operator_letters() {
        assert_eq!(
            kinds("GFp"),
            vec![
                TokenKind::Always,
                TokenKind::Eventually,
                TokenKind::Name("p".into())
            ]
        );
        assert_eq!(kinds("X1"), vec![TokenKind::Name("X1".into())]);
        assert_eq!(kinds("G_a"), vec![TokenKind::Name("G_a".into())]);
        assert_eq!(kinds("Xtrue"), vec![TokenKind::Next, TokenKind::True]);
    }

    #[test]
    fn keywords_are_whole_words() {
        assert_eq!(
            kinds("True False next nextstep"),
            vec![
                TokenKind::True,
                TokenKind::False,
                TokenKind::Next,
                TokenKind::Name("nextstep".into())
            ]
        );
    }

    #[test]
    fn names_keep_dots_and_colons() {
        assert_eq!(
            kinds("sys.loc_1 env:park"),
            vec![
                TokenKind::Name("sys.loc_1".into()),
                TokenKind::Name("env:park".into())
            ]
        );
    }

    #[test]
    fn recognizes_variable_names() {
        assert!(is_name("loc"));
        assert!(is_name("X1"));
        assert!(!is_name("Go"));
        assert!(!is_name("true"));
        assert!(!is_name(" loc"));
        assert!(!is_name("a b"));
    }

    #[test]
    fn string_constants_and_lines() {
        let tokens = tokenize("mode =\n \"Fast\"").expect("input should lex");
        assert_eq!(tokens[2].kind, TokenKind::Str("Fast".into()));
        assert_eq!(tokens[2].line, 2);
    }

    #[test]
    fn rejects_illegal_character() {
        let err = tokenize("a & $b").unwrap_err();
        assert_eq!(
            err,
            ParseError::IllegalCharacter {
                ch: '$',
                line: 1,
                offset: 4
            }
        );
        assert!(matches!(
            tokenize("x = \"open"),
            Err(ParseError::UnterminatedString { offset: 4 })
        ));
    }
}
