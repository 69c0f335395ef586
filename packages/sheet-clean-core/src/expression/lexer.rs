//! Tokenizer for filter expressions.

use crate::error::ExpressionError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Number(f64),
    Str(String),
    Ident(String),
    Punct(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Character offset in the source
    pub pos: usize,
}

// Longest first so `===` wins over `==` and `=`.
const PUNCTUATION: &[&str] = &[
    "===", "!==", "==", "!=", ">=", "<=", "&&", "||", "(", ")", "[", "]", ",", ".", "?", ":",
    "!", ">", "<", "=", "+", "-", "*", "/", "%", "≥", "≤",
];

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ExpressionError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()))
        {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text: String = chars[start..i].iter().collect();
            let value = text.parse::<f64>().map_err(|_| ExpressionError::Parse {
                message: format!("invalid number '{}'", text),
                pos: start,
            })?;
            tokens.push(Token {
                kind: TokenKind::Number(value),
                pos: start,
            });
            continue;
        }

        if c == '\'' || c == '"' || c == '`' {
            let start = i;
            let (value, next) = read_string(&chars, i)?;
            i = next;
            tokens.push(Token {
                kind: TokenKind::Str(value),
                pos: start,
            });
            continue;
        }

        if c.is_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$')
            {
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Ident(chars[start..i].iter().collect()),
                pos: start,
            });
            continue;
        }

        let punct = PUNCTUATION.iter().find(|p| {
            let len = p.chars().count();
            i + len <= chars.len() && p.chars().eq(chars[i..i + len].iter().copied())
        });
        match punct {
            Some(p) => {
                tokens.push(Token {
                    kind: TokenKind::Punct(*p),
                    pos: i,
                });
                i += p.chars().count();
            }
            None => return Err(ExpressionError::UnexpectedChar { ch: c, pos: i }),
        }
    }

    Ok(tokens)
}

fn read_string(chars: &[char], start: usize) -> Result<(String, usize), ExpressionError> {
    let quote = chars[start];
    let mut value = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            c if c == quote => return Ok((value, i + 1)),
            '$' if quote == '`' && chars.get(i + 1) == Some(&'{') => {
                return Err(ExpressionError::Unsafe("${".to_string()))
            }
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .ok_or(ExpressionError::UnterminatedString(start))?;
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => *other,
                });
                i += 2;
            }
            c => {
                value.push(c);
                i += 1;
            }
        }
    }
    Err(ExpressionError::UnterminatedString(start))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokens() {
        assert_eq!(
            kinds("row.Duration >= 3.5"),
            vec![
                TokenKind::Ident("row".into()),
                TokenKind::Punct("."),
                TokenKind::Ident("Duration".into()),
                TokenKind::Punct(">="),
                TokenKind::Number(3.5),
            ]
        );
        assert_eq!(
            kinds("a === 'it\\'s'"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Punct("==="),
                TokenKind::Str("it's".into()),
            ]
        );
    }

    #[test]
    fn test_lex_errors() {
        assert_eq!(
            tokenize("row.A > 'x"),
            Err(ExpressionError::UnterminatedString(8))
        );
        assert!(matches!(
            tokenize("row.A # 1"),
            Err(ExpressionError::UnexpectedChar { ch: '#', pos: 6 })
        ));
        assert!(matches!(tokenize("`${x}`"), Err(ExpressionError::Unsafe(_))));
    }
}
