//! Lexer for field paths using logos
//!
//! Paths look like `changeOrdersPrevious.additions`, `items.3.rate`,
//! `items[3].rate`, `items[#7].rate` (row identity) or, in patterns,
//! `items.*.rate`.

use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
pub enum PathToken<'src> {
    #[regex(r"[A-Za-z_][A-Za-z0-9_\-]*", |lex| lex.slice())]
    Name(&'src str),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    Number(u64),

    #[token(".")]
    Dot,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("#")]
    Hash,
    #[token("*")]
    Star,
}

impl PathToken<'_> {
    pub fn describe(&self) -> String {
        match self {
            PathToken::Name(name) => format!("`{}`", name),
            PathToken::Number(n) => format!("`{}`", n),
            PathToken::Dot => "`.`".to_string(),
            PathToken::LBracket => "`[`".to_string(),
            PathToken::RBracket => "`]`".to_string(),
            PathToken::Hash => "`#`".to_string(),
            PathToken::Star => "`*`".to_string(),
        }
    }
}

/// Position of a token in the path source
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken<'src> {
    pub token: PathToken<'src>,
    pub start: usize,
}

/// Lex a path into tokens, stopping at the first unrecognised character
pub fn lex(source: &str) -> Result<Vec<SpannedToken<'_>>, usize> {
    PathToken::lexer(source)
        .spanned()
        .map(|(result, span)| match result {
            Ok(token) => Ok(SpannedToken {
                token,
                start: span.start,
            }),
            Err(_) => Err(span.start),
        })
        .collect()
}
