use std::fmt::Display;

use miette::{Diagnostic, Error, LabeledSpan, NamedSource, SourceSpan, miette};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
#[error("Unexpected character '{token}'")]
#[diagnostic(
    code(lex::unexpected_character),
    help("only digits, `+ - * /` and parentheses are allowed; remove `{token}`")
)]
pub struct SingleTokenError {
    #[source_code]
    src: NamedSource<String>,

    #[label("this character")]
    bad_bit: SourceSpan,

    pub token: char,
}

impl SingleTokenError {
    pub fn line(&self) -> usize {
        self.src.inner()[..self.bad_bit.offset() + self.bad_bit.len()]
            .lines()
            .count()
    }
}

#[derive(Error, Debug, Diagnostic)]
#[error("`{operator}` has no left operand")]
#[diagnostic(
    code(lex::dangling_operator),
    help("put an integer in front of `{operator}`")
)]
pub struct DanglingOperatorError {
    #[source_code]
    src: NamedSource<String>,

    #[label("nothing to group with this operator")]
    bad_bit: SourceSpan,

    pub operator: char,
}

impl DanglingOperatorError {
    pub fn line(&self) -> usize {
        self.src.inner()[..self.bad_bit.offset() + self.bad_bit.len()]
            .lines()
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'de> {
    pub kind: TokenKind,
    pub literal: &'de str,
    /// Offset of the first byte of the token in the source.
    pub byte: usize,
    /// Set on the parentheses the lexer inserts around `*` and `/`.
    pub synthetic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Integer(i64),
    Plus,
    Minus,
    LeftParen,
    RightParen,
    Star,
    Slash,
}

impl<'de> Token<'de> {
    fn open_at(byte: usize) -> Self {
        Token {
            kind: TokenKind::LeftParen,
            literal: "(",
            byte,
            synthetic: true,
        }
    }

    fn close_at(byte: usize) -> Self {
        Token {
            kind: TokenKind::RightParen,
            literal: ")",
            byte,
            synthetic: true,
        }
    }

    /// Source span of the token; synthetic tokens cover no source text.
    pub fn span(&self) -> SourceSpan {
        SourceSpan::from(self.byte..self.end())
    }

    pub fn end(&self) -> usize {
        if self.synthetic {
            self.byte
        } else {
            self.byte + self.literal.len()
        }
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = self.literal;
        let tail = if self.synthetic { "synthetic" } else { "null" };
        match self.kind {
            TokenKind::LeftParen => write!(f, "LEFT_PAREN {lit} {tail}"),
            TokenKind::RightParen => write!(f, "RIGHT_PAREN {lit} {tail}"),
            TokenKind::Minus => write!(f, "MINUS {lit} {tail}"),
            TokenKind::Plus => write!(f, "PLUS {lit} {tail}"),
            TokenKind::Star => write!(f, "STAR {lit} {tail}"),
            TokenKind::Slash => write!(f, "SLASH {lit} {tail}"),
            TokenKind::Integer(n) => write!(f, "INTEGER {lit} {n}"),
        }
    }
}

pub struct Lexer<'de> {
    filename: Option<&'de str>,
    whole: &'de str,
    rest: &'de str,
    pub byte: usize,
}

impl<'de> Lexer<'de> {
    pub fn new(filename: Option<&'de str>, input: &'de str) -> Self {
        Lexer {
            filename,
            whole: input,
            rest: input,
            byte: 0,
        }
    }

    /// Collects every token, wrapping each `*`/`/` and its two operands in
    /// synthetic parentheses.
    ///
    /// The `(` goes in front of whatever token was emitted last and the `)`
    /// follows the next integer, so `3*4` becomes `( 3 * 4 )`. Anything more
    /// involved than a single operator between two integers comes out
    /// unbalanced and is left for the parser to reject.
    pub fn tokenize(self) -> Result<Vec<Token<'de>>, Error> {
        let filename = self.filename;
        let whole = self.whole;

        let mut tokens: Vec<Token<'de>> = Vec::new();
        let mut close_pending = false;

        for token in self {
            let token = token?;
            match token.kind {
                TokenKind::Star | TokenKind::Slash => {
                    let Some(previous) = tokens.last().map(|t| t.byte) else {
                        return Err(DanglingOperatorError {
                            src: NamedSource::new(filename.unwrap_or("<input>"), whole.to_string()),
                            bad_bit: token.span(),
                            operator: if token.kind == TokenKind::Star { '*' } else { '/' },
                        }
                        .into());
                    };
                    tokens.insert(tokens.len() - 1, Token::open_at(previous));
                    tokens.push(token);
                    close_pending = true;
                }
                TokenKind::Integer(_) => {
                    tokens.push(token);
                    if close_pending {
                        tokens.push(Token::close_at(token.end()));
                        close_pending = false;
                    }
                }
                _ => tokens.push(token),
            }
        }

        Ok(tokens)
    }
}

impl<'de> Iterator for Lexer<'de> {
    type Item = Result<Token<'de>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut chars = self.rest.chars();
            let c = chars.next()?;
            let literal = &self.rest[..c.len_utf8()];
            let cur = self.rest;
            let start = self.byte;
            self.rest = chars.as_str();
            self.byte += c.len_utf8();

            let process = |kind: TokenKind| {
                Some(Ok(Token {
                    kind,
                    literal,
                    byte: start,
                    synthetic: false,
                }))
            };

            match c {
                '(' => return process(TokenKind::LeftParen),
                ')' => return process(TokenKind::RightParen),
                '-' => return process(TokenKind::Minus),
                '+' => return process(TokenKind::Plus),
                '*' => return process(TokenKind::Star),
                '/' => return process(TokenKind::Slash),
                '0'..='9' => {}
                ' ' | '\r' | '\t' | '\n' => continue,
                c => {
                    return Some(Err(SingleTokenError {
                        src: NamedSource::new(
                            self.filename.unwrap_or("<input>"),
                            self.whole.to_string(),
                        ),
                        bad_bit: SourceSpan::from(start..self.byte),
                        token: c,
                    }
                    .into()));
                }
            }

            let first_non_digit = cur
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(cur.len());
            let literal = &cur[..first_non_digit];

            let extra_bytes = literal.len() - c.len_utf8();
            self.byte += extra_bytes;
            self.rest = &self.rest[extra_bytes..];

            let n = match literal.parse() {
                Ok(n) => n,
                Err(e) => {
                    return Some(Err(miette!(
                        code = "ParseIntError",
                        url = "https://doc.rust-lang.org/std/num/struct.ParseIntError.html",
                        labels = vec![LabeledSpan::at(start..self.byte, "this integer literal")],
                        "{e}",
                    )
                    .with_source_code(self.whole.to_string())));
                }
            };

            return Some(Ok(Token {
                kind: TokenKind::Integer(n),
                literal,
                byte: start,
                synthetic: false,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(None, input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lex_addition() {
        assert_eq!(
            kinds("2+3"),
            vec![TokenKind::Integer(2), TokenKind::Plus, TokenKind::Integer(3)]
        );
    }

    #[test]
    fn lex_digit_run_is_one_token() {
        let tokens = Lexer::new(None, "1024-7").tokenize().unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].literal, "1024");
        assert_eq!(tokens[0].kind, TokenKind::Integer(1024));
        assert_eq!(tokens[1].byte, 4);
        assert_eq!(tokens[2].literal, "7");
    }

    #[test]
    fn lex_multiplication_gets_synthetic_parens() {
        let tokens = Lexer::new(None, "3*4").tokenize().unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::LeftParen,
                TokenKind::Integer(3),
                TokenKind::Star,
                TokenKind::Integer(4),
                TokenKind::RightParen,
            ]
        );
        assert!(tokens[0].synthetic);
        assert!(!tokens[1].synthetic);
        assert!(tokens[4].synthetic);
        assert_eq!(tokens[0].byte, 0);
        assert_eq!(tokens[4].byte, 3);
    }

    #[test]
    fn lex_division_inside_sum() {
        assert_eq!(
            kinds("1+6/2"),
            vec![
                TokenKind::Integer(1),
                TokenKind::Plus,
                TokenKind::LeftParen,
                TokenKind::Integer(6),
                TokenKind::Slash,
                TokenKind::Integer(2),
                TokenKind::RightParen,
            ]
        );
    }

    #[test]
    fn lex_chained_multiplication_is_unbalanced() {
        // The second `*` opens in front of the synthetic `)` of the first.
        assert_eq!(
            kinds("2*3*4"),
            vec![
                TokenKind::LeftParen,
                TokenKind::Integer(2),
                TokenKind::Star,
                TokenKind::Integer(3),
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::Star,
                TokenKind::Integer(4),
                TokenKind::RightParen,
            ]
        );
    }

    #[test]
    fn lex_skips_whitespace() {
        assert_eq!(
            kinds(" 10 -\t4\n"),
            vec![TokenKind::Integer(10), TokenKind::Minus, TokenKind::Integer(4)]
        );
    }

    #[test]
    fn lex_raw_iterator_has_no_synthetic_tokens() {
        let tokens: Vec<_> = Lexer::new(None, "3*4")
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(|t| !t.synthetic));
    }

    #[test]
    fn lex_unexpected_character() {
        let err = Lexer::new(None, "1+x").tokenize().unwrap_err();
        let err = err.downcast_ref::<SingleTokenError>().unwrap();
        assert_eq!(err.token, 'x');
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn lex_unexpected_multibyte_character() {
        let err = Lexer::new(None, "1+é").tokenize().unwrap_err();
        let err = err.downcast_ref::<SingleTokenError>().unwrap();
        assert_eq!(err.token, 'é');
        assert_eq!(err.line(), 1);

        let err = Lexer::new(None, "1+\n2\n€").tokenize().unwrap_err();
        assert_eq!(err.downcast_ref::<SingleTokenError>().unwrap().line(), 3);
    }

    #[test]
    fn synthetic_span_is_empty() {
        let tokens = Lexer::new(None, "12*3").tokenize().unwrap();
        assert_eq!(tokens[0].span(), SourceSpan::from(0..0));
        assert_eq!(tokens[1].span(), SourceSpan::from(0..2));
        assert_eq!(tokens[5].span(), SourceSpan::from(4..4));
    }

    #[test]
    fn lex_leading_star_has_no_operand() {
        let err = Lexer::new(None, "*3").tokenize().unwrap_err();
        let err = err.downcast_ref::<DanglingOperatorError>().unwrap();
        assert_eq!(err.operator, '*');
    }

    #[test]
    fn lex_integer_overflow() {
        assert!(Lexer::new(None, "99999999999999999999").tokenize().is_err());
    }

    #[test]
    fn token_display() {
        let tokens = Lexer::new(None, "6/2").tokenize().unwrap();
        let lines: Vec<_> = tokens.iter().map(|t| t.to_string()).collect();
        assert_eq!(
            lines,
            vec![
                "LEFT_PAREN ( synthetic",
                "INTEGER 6 6",
                "SLASH / null",
                "INTEGER 2 2",
                "RIGHT_PAREN ) synthetic",
            ]
        );
    }
}
