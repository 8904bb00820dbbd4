use std::fmt;

use serde::{Deserialize, Serialize};

/// Token types produced by the filter lexer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Token {
    /// A string literal, escapes already resolved.
    String(String),
    /// An integer literal.
    Integer(i64),
    /// A floating-point literal.
    Float(f64),
    /// A boolean literal.
    Bool(bool),
    /// The null literal.
    Null,

    /// An identifier. Parameter references keep their leading `$`.
    Ident(String),

    Eq,  // ==
    Neq, // !=
    Lt,  // <
    Gt,  // >
    Lte, // <=
    Gte, // >=
    And, // &&
    Or,  // ||
    Not, // !
    In,  // in
    Asc, // asc
    Desc, // desc

    Star,  // *
    Dot,   // .
    Comma, // ,
    Pipe,  // |
    At,    // @

    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]

    /// The end of the input.
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::String(s) => write!(f, "\"{s}\""),
            Token::Integer(n) => write!(f, "{n}"),
            Token::Float(n) => write!(f, "{n}"),
            Token::Bool(b) => write!(f, "{b}"),
            Token::Null => write!(f, "null"),
            Token::Ident(s) => write!(f, "{s}"),
            Token::Eq => write!(f, "=="),
            Token::Neq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Lte => write!(f, "<="),
            Token::Gte => write!(f, ">="),
            Token::And => write!(f, "&&"),
            Token::Or => write!(f, "||"),
            Token::Not => write!(f, "!"),
            Token::In => write!(f, "in"),
            Token::Asc => write!(f, "asc"),
            Token::Desc => write!(f, "desc"),
            Token::Star => write!(f, "*"),
            Token::Dot => write!(f, "."),
            Token::Comma => write!(f, ","),
            Token::Pipe => write!(f, "|"),
            Token::At => write!(f, "@"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// Position in source code for error reporting, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A token with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Lexer error.
#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
    #[error("unterminated string starting at position {0}")]
    UnterminatedString(usize),
    #[error("invalid number literal '{0}' at position {1}")]
    InvalidNumber(String, usize),
}

/// Tokenize a filter expression into a sequence of tokens.
pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, LexError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut pos = 0;

    let next_is = |pos: usize, c: char| chars.get(pos + 1) == Some(&c);

    while pos < chars.len() {
        let ch = chars[pos];

        if ch.is_whitespace() {
            pos += 1;
            continue;
        }

        // Single-line comments
        if ch == '/' && next_is(pos, '/') {
            while pos < chars.len() && chars[pos] != '\n' {
                pos += 1;
            }
            continue;
        }

        let start = pos;

        let token = match ch {
            '*' => {
                pos += 1;
                Token::Star
            }
            '.' => {
                pos += 1;
                Token::Dot
            }
            ',' => {
                pos += 1;
                Token::Comma
            }
            '@' => {
                pos += 1;
                Token::At
            }
            '(' => {
                pos += 1;
                Token::LParen
            }
            ')' => {
                pos += 1;
                Token::RParen
            }
            '[' => {
                pos += 1;
                Token::LBracket
            }
            ']' => {
                pos += 1;
                Token::RBracket
            }
            '=' if next_is(pos, '=') => {
                pos += 2;
                Token::Eq
            }
            '!' if next_is(pos, '=') => {
                pos += 2;
                Token::Neq
            }
            '!' => {
                pos += 1;
                Token::Not
            }
            '<' if next_is(pos, '=') => {
                pos += 2;
                Token::Lte
            }
            '<' => {
                pos += 1;
                Token::Lt
            }
            '>' if next_is(pos, '=') => {
                pos += 2;
                Token::Gte
            }
            '>' => {
                pos += 1;
                Token::Gt
            }
            '&' if next_is(pos, '&') => {
                pos += 2;
                Token::And
            }
            '|' if next_is(pos, '|') => {
                pos += 2;
                Token::Or
            }
            '|' => {
                pos += 1;
                Token::Pipe
            }
            '-' if chars.get(pos + 1).is_some_and(|c| c.is_ascii_digit()) => {
                pos += 1;
                let (token, end) = lex_number(&chars, pos, true)?;
                pos = end;
                token
            }
            '"' | '\'' => {
                let quote = ch;
                pos += 1;
                let mut value = String::new();
                loop {
                    match chars.get(pos) {
                        None => return Err(LexError::UnterminatedString(start)),
                        Some(&c) if c == quote => {
                            pos += 1;
                            break;
                        }
                        Some('\\') => {
                            let escaped = chars
                                .get(pos + 1)
                                .ok_or(LexError::UnterminatedString(start))?;
                            value.push(match escaped {
                                'n' => '\n',
                                't' => '\t',
                                other => *other,
                            });
                            pos += 2;
                        }
                        Some(&c) => {
                            value.push(c);
                            pos += 1;
                        }
                    }
                }
                Token::String(value)
            }
            c if c.is_ascii_digit() => {
                let (token, end) = lex_number(&chars, pos, false)?;
                pos = end;
                token
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                pos += 1;
                while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                    pos += 1;
                }
                let word: String = chars[start..pos].iter().collect();
                match word.as_str() {
                    "true" => Token::Bool(true),
                    "false" => Token::Bool(false),
                    "null" => Token::Null,
                    "in" => Token::In,
                    "asc" => Token::Asc,
                    "desc" => Token::Desc,
                    _ => Token::Ident(word),
                }
            }
            _ => return Err(LexError::UnexpectedChar(ch, pos)),
        };

        tokens.push(SpannedToken {
            token,
            span: Span { start, end: pos },
        });
    }

    tokens.push(SpannedToken {
        token: Token::Eof,
        span: Span {
            start: pos,
            end: pos,
        },
    });

    Ok(tokens)
}

/// Lex a numeric literal starting at `pos` (just past any minus sign).
fn lex_number(chars: &[char], mut pos: usize, negative: bool) -> Result<(Token, usize), LexError> {
    let start = pos;
    let mut is_float = false;
    while pos < chars.len() {
        let c = chars[pos];
        if c.is_ascii_digit() {
            pos += 1;
        } else if c == '.' && !is_float && chars.get(pos + 1).is_some_and(|n| n.is_ascii_digit()) {
            is_float = true;
            pos += 1;
        } else {
            break;
        }
    }

    let mut text: String = chars[start..pos].iter().collect();
    if negative {
        text.insert(0, '-');
    }
    let token = if is_float {
        text.parse()
            .map(Token::Float)
            .map_err(|_| LexError::InvalidNumber(text.clone(), start))?
    } else {
        text.parse()
            .map(Token::Integer)
            .map_err(|_| LexError::InvalidNumber(text.clone(), start))?
    };
    Ok((token, pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn tokenize_simple_filter() {
        let tokens = tok("*[category == \"Analytics\"]");
        assert_eq!(tokens[0], Token::Star);
        assert_eq!(tokens[1], Token::LBracket);
        assert_eq!(tokens[2], Token::Ident("category".into()));
        assert_eq!(tokens[3], Token::Eq);
        assert_eq!(tokens[4], Token::String("Analytics".into()));
        assert_eq!(tokens[5], Token::RBracket);
        assert_eq!(tokens[6], Token::Eof);
    }

    #[test]
    fn tokenize_params_and_membership() {
        let tokens = tok("$tag in tags && _id != $id");
        assert_eq!(tokens[0], Token::Ident("$tag".into()));
        assert_eq!(tokens[1], Token::In);
        assert_eq!(tokens[2], Token::Ident("tags".into()));
        assert_eq!(tokens[3], Token::And);
        assert_eq!(tokens[4], Token::Ident("_id".into()));
        assert_eq!(tokens[5], Token::Neq);
        assert_eq!(tokens[6], Token::Ident("$id".into()));
    }

    #[test]
    fn tokenize_numbers() {
        let tokens = tok("42 3.125 -7");
        assert_eq!(tokens[0], Token::Integer(42));
        assert_eq!(tokens[1], Token::Float(3.125));
        assert_eq!(tokens[2], Token::Integer(-7));
    }

    #[test]
    fn tokenize_comparison_operators() {
        let tokens = tok("< > <= >= == != !");
        assert_eq!(tokens[0], Token::Lt);
        assert_eq!(tokens[1], Token::Gt);
        assert_eq!(tokens[2], Token::Lte);
        assert_eq!(tokens[3], Token::Gte);
        assert_eq!(tokens[4], Token::Eq);
        assert_eq!(tokens[5], Token::Neq);
        assert_eq!(tokens[6], Token::Not);
    }

    #[test]
    fn tokenize_order_pipe() {
        let tokens = tok("| order(createdAt desc)");
        assert_eq!(tokens[0], Token::Pipe);
        assert_eq!(tokens[1], Token::Ident("order".into()));
        assert_eq!(tokens[2], Token::LParen);
        assert_eq!(tokens[3], Token::Ident("createdAt".into()));
        assert_eq!(tokens[4], Token::Desc);
        assert_eq!(tokens[5], Token::RParen);
    }

    #[test]
    fn string_escapes_and_unicode() {
        let tokens = tok(r#"'Value\'s' "café""#);
        assert_eq!(tokens[0], Token::String("Value's".into()));
        assert_eq!(tokens[1], Token::String("café".into()));
    }

    #[test]
    fn unterminated_string_error() {
        assert!(matches!(
            tokenize("\"hello"),
            Err(LexError::UnterminatedString(0))
        ));
    }

    #[test]
    fn lone_ampersand_is_rejected() {
        assert!(matches!(
            tokenize("a & b"),
            Err(LexError::UnexpectedChar('&', 2))
        ));
    }
}
