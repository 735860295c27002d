//! logos-based tokenizer for the inside of `{...}` expressions.
//!
//! The grammar is tiny: identifiers (dotted paths), numbers, quoted literals,
//! `==`, `!=`, `?`, and `:`. Characters outside that set come back as `None`
//! instead of aborting the lex, so free-form ternary branches (`{x?yes:no}`)
//! still tokenize; only the condition half rejects them.

use std::ops::Range;

use logos::Logos;

/// Expression token produced by the lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    /// `==`
    #[token("==")]
    Eq,

    /// `!=`
    #[token("!=")]
    NotEq,

    /// `?`
    #[token("?")]
    Question,

    /// `:`
    #[token(":")]
    Colon,

    /// Single-quoted literal: `'active'`.
    #[regex(r"'[^']*'")]
    SingleQuoted,

    /// Double-quoted literal: `"active"`.
    #[regex(r#""[^"]*""#)]
    DoubleQuoted,

    /// Number literal: `5`, `-2.5`.
    #[regex(r"-?[0-9]+(\.[0-9]+)?")]
    Number,

    /// Identifier or dotted path: `name`, `user.address.city`, `row.0`.
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$\-]*(\.[A-Za-z0-9_$\-]+)*")]
    Ident,
}

impl Token {
    /// Whether this token is a literal usable on the right of `==`/`!=`.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            Self::SingleQuoted | Self::DoubleQuoted | Self::Number | Self::Ident
        )
    }
}

/// Tokenize an expression into `(token, span)` pairs.
///
/// Lexing never fails: a character the grammar does not know yields `None`
/// for its span.
pub fn tokenize(input: &str) -> Vec<(Option<Token>, Range<usize>)> {
    Token::lexer(input)
        .spanned()
        .map(|(result, span)| (result.ok(), span))
        .collect()
}
