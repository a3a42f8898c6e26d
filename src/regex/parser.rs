//! Recursive descent parser for regular expressions.
//!
//! Grammar, after implicit concatenation has been made explicit:
//! ```text
//! expr   ::= term (('+' | '|') term)*
//! term   ::= factor ('.' factor)*
//! factor ::= atom '*'*
//! atom   ::= SYMBOL | 'ε' | '(' expr ')'
//! ```
//! Symbols are alphanumeric characters, whitespace is ignored.

use thiserror::Error;
use tracing::trace;

use super::Regex;
use crate::automaton::EPSILON;

/// Information about what went wrong while parsing a regular expression. Positions are
/// 0-based character offsets into the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegexParseError {
    /// The input contains no token at all.
    #[error("the expression is empty")]
    Empty,
    /// A character that is neither a symbol nor an operator.
    #[error("invalid character `{found}` at position {position}")]
    InvalidCharacter {
        /// Offset of the character.
        position: usize,
        /// The offending character.
        found: char,
    },
    /// An operator where an operand was expected.
    #[error("unexpected `{found}` at position {position}")]
    UnexpectedToken {
        /// Offset of the token.
        position: usize,
        /// The offending token.
        found: char,
    },
    /// The input ends where an operand was expected.
    #[error("unexpected end of expression at position {position}")]
    UnexpectedEnd {
        /// Length of the input.
        position: usize,
    },
    /// A parenthesis that is never closed.
    #[error("parenthesis opened at position {position} is never closed")]
    UnbalancedParenthesis {
        /// Offset of the opening parenthesis.
        position: usize,
    },
    /// Input remains after a complete expression, which can only be a closing parenthesis
    /// without partner.
    #[error("unmatched `{found}` at position {position}")]
    TrailingInput {
        /// Offset of the first token that was not consumed.
        position: usize,
        /// The token that was not consumed.
        found: char,
    },
}

impl RegexParseError {
    /// The position at which the error occurred, if there is one.
    pub fn position(&self) -> Option<usize> {
        match self {
            RegexParseError::Empty => None,
            RegexParseError::InvalidCharacter { position, .. }
            | RegexParseError::UnexpectedToken { position, .. }
            | RegexParseError::TrailingInput { position, .. }
            | RegexParseError::UnexpectedEnd { position }
            | RegexParseError::UnbalancedParenthesis { position } => Some(*position),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Symbol(char),
    Epsilon,
    Union(char),
    Dot,
    Star,
    LeftParen,
    RightParen,
}

impl TokenKind {
    fn as_char(&self) -> char {
        match self {
            TokenKind::Symbol(c) | TokenKind::Union(c) => *c,
            TokenKind::Epsilon => EPSILON,
            TokenKind::Dot => '.',
            TokenKind::Star => '*',
            TokenKind::LeftParen => '(',
            TokenKind::RightParen => ')',
        }
    }

    fn ends_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::Symbol(_) | TokenKind::Epsilon | TokenKind::RightParen | TokenKind::Star
        )
    }

    fn starts_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::Symbol(_) | TokenKind::Epsilon | TokenKind::LeftParen
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct Token {
    position: usize,
    kind: TokenKind,
}

/// Splits the input into tokens and inserts the implicit concatenation operator between
/// two adjacent operands.
fn tokenize(input: &str) -> Result<Vec<Token>, RegexParseError> {
    let mut tokens: Vec<Token> = Vec::new();
    for (position, c) in input.chars().enumerate() {
        let kind = match c {
            c if c.is_whitespace() => continue,
            EPSILON => TokenKind::Epsilon,
            '+' | '|' => TokenKind::Union(c),
            '.' => TokenKind::Dot,
            '*' => TokenKind::Star,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            c if c.is_alphanumeric() => TokenKind::Symbol(c),
            found => return Err(RegexParseError::InvalidCharacter { position, found }),
        };
        if let Some(previous) = tokens.last() {
            if previous.kind.ends_operand() && kind.starts_operand() {
                tokens.push(Token {
                    position,
                    kind: TokenKind::Dot,
                });
            }
        }
        tokens.push(Token { position, kind });
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.cursor).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn expression(&mut self) -> Result<Regex, RegexParseError> {
        let mut out = self.term()?;
        while let Some(Token {
            kind: TokenKind::Union(_),
            ..
        }) = self.peek()
        {
            self.advance();
            let rhs = self.term()?;
            out = Regex::Union(Box::new(out), Box::new(rhs));
        }
        Ok(out)
    }

    fn term(&mut self) -> Result<Regex, RegexParseError> {
        let mut out = self.factor()?;
        while let Some(Token {
            kind: TokenKind::Dot,
            ..
        }) = self.peek()
        {
            self.advance();
            let rhs = self.factor()?;
            out = Regex::Concat(Box::new(out), Box::new(rhs));
        }
        Ok(out)
    }

    fn factor(&mut self) -> Result<Regex, RegexParseError> {
        let mut out = self.atom()?;
        while let Some(Token {
            kind: TokenKind::Star,
            ..
        }) = self.peek()
        {
            self.advance();
            out = Regex::Star(Box::new(out));
        }
        Ok(out)
    }

    fn atom(&mut self) -> Result<Regex, RegexParseError> {
        let Some(token) = self.advance() else {
            return Err(RegexParseError::UnexpectedEnd { position: self.end });
        };
        match token.kind {
            TokenKind::Symbol(c) => Ok(Regex::Symbol(c)),
            TokenKind::Epsilon => Ok(Regex::Epsilon),
            TokenKind::LeftParen => {
                let inner = self.expression()?;
                match self.advance() {
                    Some(Token {
                        kind: TokenKind::RightParen,
                        ..
                    }) => Ok(inner),
                    _ => Err(RegexParseError::UnbalancedParenthesis {
                        position: token.position,
                    }),
                }
            }
            other => Err(RegexParseError::UnexpectedToken {
                position: token.position,
                found: other.as_char(),
            }),
        }
    }
}

/// Parses a regular expression. Union is written `+` or `|`, concatenation `.` or by
/// juxtaposition and star binds strongest, followed by concatenation and union. The
/// produced tree reflects the input exactly, no simplification takes place.
///
/// `ε` stands for the empty word and may appear wherever an operand may, so `aε`, `ε*`
/// and `a+ε` are all accepted.
///
/// ```
/// use kleene::regex::{parse, Regex};
///
/// let r = parse("(a|b)*ab").unwrap();
/// assert_eq!(r.leaves(), vec!['a', 'b', 'a', 'b']);
/// assert!(parse("(ab").is_err());
/// ```
pub fn parse(input: &str) -> Result<Regex, RegexParseError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(RegexParseError::Empty);
    }
    let mut parser = Parser {
        tokens,
        cursor: 0,
        end: input.chars().count(),
    };
    let out = parser.expression()?;
    if let Some(token) = parser.peek() {
        return Err(RegexParseError::TrailingInput {
            position: token.position,
            found: token.kind.as_char(),
        });
    }
    trace!("parsed {input:?} into {out}");
    Ok(out)
}

impl std::str::FromStr for Regex {
    type Err = RegexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(c: char) -> Box<Regex> {
        Box::new(Regex::Symbol(c))
    }

    #[test]
    fn precedence_and_implicit_concatenation() {
        assert_eq!(
            parse("a+bc*").unwrap(),
            Regex::Union(
                sym('a'),
                Box::new(Regex::Concat(sym('b'), Box::new(Regex::Star(sym('c')))))
            )
        );
        assert_eq!(parse("a.b").unwrap(), parse("ab").unwrap());
        assert_eq!(parse("a | b").unwrap(), parse("a+b").unwrap());
        assert_eq!(
            parse("(a)(b)").unwrap(),
            Regex::Concat(sym('a'), sym('b'))
        );
        assert_eq!(parse("a**").unwrap(), Regex::Star(Box::new(Regex::Star(sym('a')))));
        assert_eq!(
            parse("ε+a").unwrap(),
            Regex::Union(Box::new(Regex::Epsilon), sym('a'))
        );
    }

    #[test]
    fn display_reparses() {
        for input in ["(a|b)*ab", "a(b+c)*d", "(ab)*+ε", "a**", "((a))"] {
            let r = parse(input).unwrap();
            assert_eq!(parse(&r.to_string()).unwrap().to_string(), r.to_string());
        }
    }

    #[test]
    fn errors_carry_positions() {
        assert_eq!(parse("  "), Err(RegexParseError::Empty));
        assert_eq!(
            parse("a#b"),
            Err(RegexParseError::InvalidCharacter {
                position: 1,
                found: '#'
            })
        );
        assert_eq!(
            parse("a+*"),
            Err(RegexParseError::UnexpectedToken {
                position: 2,
                found: '*'
            })
        );
        assert_eq!(parse("ab+"), Err(RegexParseError::UnexpectedEnd { position: 3 }));
        assert_eq!(
            parse("a(b+c"),
            Err(RegexParseError::UnbalancedParenthesis { position: 1 })
        );
        assert_eq!(
            parse("ab)c"),
            Err(RegexParseError::TrailingInput {
                position: 2,
                found: ')'
            })
        );
        assert_eq!(
            parse("a)").unwrap_err().to_string(),
            "unmatched `)` at position 1"
        );
        assert_eq!(
            parse("()"),
            Err(RegexParseError::UnexpectedToken {
                position: 1,
                found: ')'
            })
        );
        assert_eq!(parse("a(b").unwrap_err().position(), Some(1));
    }

    #[test]
    fn epsilon_is_an_operand() {
        assert_eq!(
            parse("aε").unwrap(),
            Regex::Concat(sym('a'), Box::new(Regex::Epsilon))
        );
        assert_eq!(parse("ε*").unwrap(), Regex::Star(Box::new(Regex::Epsilon)));

        let padded = parse("aε").unwrap().glushkov();
        assert!(padded.accepts("a".chars()));
        assert!(!padded.accepts("".chars()));
        assert!(!padded.accepts("aa".chars()));

        let star = parse("ε*").unwrap().glushkov();
        assert!(star.accepts("".chars()));
        assert!(parse("a+ε").unwrap().glushkov().accepts("".chars()));
    }
}
