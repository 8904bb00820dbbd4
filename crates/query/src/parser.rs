use crate::ast::{Direction, Expr, OrderBy, Pipeline};
use crate::lexer::{tokenize, LexError, SpannedToken, Token};

/// Parser error types.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),
    #[error("unexpected token: {found}, expected: {expected}")]
    UnexpectedToken { found: String, expected: String },
    #[error("unexpected end of input")]
    UnexpectedEof,
}

/// Parse a bare filter expression, e.g. `category == $category && _id != $id`.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(tokenize(input)?);
    let expr = parser.parse_filter_expr()?;
    parser.expect(&Token::Eof)?;
    Ok(expr)
}

/// Parse a full query: `*`, `*[filter]`, optionally followed by
/// `| order(field [asc|desc], ...)` stages.
pub fn parse_pipeline(input: &str) -> Result<Pipeline, ParseError> {
    let mut parser = Parser::new(tokenize(input)?);
    let pipeline = parser.parse_pipeline()?;
    parser.expect(&Token::Eof)?;
    Ok(pipeline)
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .map(|t| &t.token)
            .unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ParseError> {
        let found = self.advance();
        if &found == expected {
            Ok(())
        } else if found == Token::Eof {
            Err(ParseError::UnexpectedEof)
        } else {
            Err(ParseError::UnexpectedToken {
                found: found.to_string(),
                expected: expected.to_string(),
            })
        }
    }

    fn parse_pipeline(&mut self) -> Result<Pipeline, ParseError> {
        self.expect(&Token::Star)?;
        let mut pipeline = Pipeline::default();

        if self.peek() == &Token::LBracket {
            self.advance();
            pipeline.filter = Some(self.parse_filter_expr()?);
            self.expect(&Token::RBracket)?;
        }

        while self.peek() == &Token::Pipe {
            self.advance();
            match self.advance() {
                Token::Ident(name) if name == "order" => {
                    self.expect(&Token::LParen)?;
                    loop {
                        pipeline.order.push(self.parse_order_key()?);
                        if self.peek() == &Token::Comma {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                    self.expect(&Token::RParen)?;
                }
                other => {
                    return Err(ParseError::UnexpectedToken {
                        found: other.to_string(),
                        expected: "order(...)".to_string(),
                    })
                }
            }
        }

        Ok(pipeline)
    }

    fn parse_order_key(&mut self) -> Result<OrderBy, ParseError> {
        let field = match self.advance() {
            Token::Ident(name) if !name.starts_with('$') => name,
            Token::Eof => return Err(ParseError::UnexpectedEof),
            other => {
                return Err(ParseError::UnexpectedToken {
                    found: other.to_string(),
                    expected: "field name".to_string(),
                })
            }
        };
        let direction = match self.peek() {
            Token::Desc => {
                self.advance();
                Direction::Desc
            }
            Token::Asc => {
                self.advance();
                Direction::Asc
            }
            _ => Direction::Asc,
        };
        Ok(OrderBy { field, direction })
    }

    // `||` binds looser than `&&`.
    fn parse_filter_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and_expr()?;
        while self.peek() == &Token::Or {
            self.advance();
            let right = self.parse_and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_comparison()?;
        while self.peek() == &Token::And {
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_primary()?;

        let ctor: fn(Box<Expr>, Box<Expr>) -> Expr = match self.peek() {
            Token::Eq => Expr::Eq,
            Token::Neq => Expr::Neq,
            Token::Lt => Expr::Lt,
            Token::Gt => Expr::Gt,
            Token::Lte => Expr::Lte,
            Token::Gte => Expr::Gte,
            Token::In => Expr::In,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_primary()?;
        Ok(ctor(Box::new(left), Box::new(right)))
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.advance() {
            Token::Ident(name) => {
                if let Some(param) = name.strip_prefix('$') {
                    return Ok(Expr::Param(param.to_string()));
                }

                // Function calls: fn(args)
                if self.peek() == &Token::LParen {
                    self.advance();
                    let args = self.parse_list(&Token::RParen)?;
                    return Ok(Expr::FuncCall(name, args));
                }

                let mut expr = Expr::Ident(name);
                // Dot access chains: a.b.c
                while self.peek() == &Token::Dot {
                    self.advance();
                    match self.advance() {
                        Token::Ident(field) => expr = Expr::DotAccess(Box::new(expr), field),
                        other => {
                            return Err(ParseError::UnexpectedToken {
                                found: other.to_string(),
                                expected: "field name".to_string(),
                            })
                        }
                    }
                }
                Ok(expr)
            }
            Token::String(s) => Ok(Expr::StringLiteral(s)),
            Token::Integer(n) => Ok(Expr::IntLiteral(n)),
            Token::Float(n) => Ok(Expr::FloatLiteral(n)),
            Token::Bool(b) => Ok(Expr::BoolLiteral(b)),
            Token::Null => Ok(Expr::Null),
            Token::At => Ok(Expr::This),
            Token::Star => Ok(Expr::Everything),
            Token::Not => {
                let expr = self.parse_primary()?;
                Ok(Expr::Not(Box::new(expr)))
            }
            Token::LParen => {
                let expr = self.parse_filter_expr()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Token::LBracket => Ok(Expr::Array(self.parse_list(&Token::RBracket)?)),
            Token::Eof => Err(ParseError::UnexpectedEof),
            other => Err(ParseError::UnexpectedToken {
                found: other.to_string(),
                expected: "expression".to_string(),
            }),
        }
    }

    /// Comma-separated expressions up to and including `close`.
    fn parse_list(&mut self, close: &Token) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        if self.peek() != close {
            items.push(self.parse_filter_expr()?);
            while self.peek() == &Token::Comma {
                self.advance();
                items.push(self.parse_filter_expr()?);
            }
        }
        self.expect(close)?;
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_everything() {
        let pipeline = parse_pipeline("*").unwrap();
        assert!(pipeline.filter.is_none());
        assert!(pipeline.order.is_empty());
    }

    #[test]
    fn parse_simple_filter() {
        let pipeline = parse_pipeline("*[status == \"published\"]").unwrap();
        match pipeline.filter {
            Some(Expr::Eq(left, right)) => {
                assert!(matches!(left.as_ref(), Expr::Ident(n) if n == "status"));
                assert!(matches!(right.as_ref(), Expr::StringLiteral(s) if s == "published"));
            }
            other => panic!("expected Eq, got {other:?}"),
        }
    }

    #[test]
    fn parse_order_stage() {
        let pipeline =
            parse_pipeline("*[status == \"published\"] | order(createdAt desc, title)").unwrap();
        assert_eq!(
            pipeline.order,
            vec![OrderBy::desc("createdAt"), OrderBy::asc("title")]
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let expr = parse("a == 1 || b == 2 && c == 3").unwrap();
        match expr {
            Expr::Or(_, right) => assert!(matches!(*right, Expr::And(_, _))),
            other => panic!("expected Or, got {other:?}"),
        }
    }

    #[test]
    fn parse_params_and_membership() {
        let expr = parse("$tag in tags && _id != $id").unwrap();
        match expr {
            Expr::And(left, right) => {
                match *left {
                    Expr::In(needle, haystack) => {
                        assert_eq!(*needle, Expr::Param("tag".into()));
                        assert_eq!(*haystack, Expr::Ident("tags".into()));
                    }
                    other => panic!("expected In, got {other:?}"),
                }
                assert!(matches!(*right, Expr::Neq(_, _)));
            }
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn parse_dot_access() {
        let expr = parse("author.name").unwrap();
        match expr {
            Expr::DotAccess(base, field) => {
                assert!(matches!(*base, Expr::Ident(n) if n == "author"));
                assert_eq!(field, "name");
            }
            _ => panic!("expected DotAccess, got {expr:?}"),
        }
    }

    #[test]
    fn parse_function_call() {
        let expr = parse("count(tags) > 0").unwrap();
        match expr {
            Expr::Gt(left, _) => match *left {
                Expr::FuncCall(name, args) => {
                    assert_eq!(name, "count");
                    assert_eq!(args.len(), 1);
                }
                other => panic!("expected FuncCall, got {other:?}"),
            },
            other => panic!("expected Gt, got {other:?}"),
        }
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        assert!(matches!(
            parse("a == 1 b"),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(parse("a =="), Err(ParseError::UnexpectedEof)));
    }
}
