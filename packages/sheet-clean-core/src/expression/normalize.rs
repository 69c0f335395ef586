//! Rewrites loosely written expressions into `row.`-qualified form.

use super::parser::Method;

/// Names that are never treated as bare field references.
const RESERVED: &[&str] = &[
    "row", "true", "false", "null", "undefined", "NaN", "and", "or", "not", "Number",
    "parseInt", "parseFloat", "String", "Boolean", "JSON", "Array",
];

const ALIASES: &[&str] = &["item", "data"];

/// Normalizes a generated expression.
///
/// Unless the expression already starts with `row.`, bare identifiers that are
/// followed by a comparison operator or used as a method receiver become
/// `row.` field references (`Duration > 3` becomes `row.Duration > 3`). The
/// `item.` and `data.` accessors are always rewritten to `row.`. String
/// literals are copied untouched.
pub fn normalize_expression(expression: &str) -> String {
    let source = expression.trim();
    let qualify = !source.starts_with("row.");
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' || c == '"' || c == '`' {
            let start = i;
            i += 1;
            while i < chars.len() && chars[i] != c {
                if chars[i] == '\\' {
                    i += 1;
                }
                i += 1;
            }
            i = (i + 1).min(chars.len());
            out.extend(&chars[start..i]);
            continue;
        }

        if c.is_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$')
            {
                i += 1;
            }
            let ident: String = chars[start..i].iter().collect();
            let after_dot = out.trim_end().ends_with('.');
            let rest = &chars[i..];

            if !after_dot && ALIASES.contains(&ident.as_str()) && next_non_space(rest) == Some('.') {
                out.push_str("row");
            } else if qualify
                && !after_dot
                && !RESERVED.contains(&ident.as_str())
                && !ALIASES.contains(&ident.as_str())
                && (before_comparison(rest) || before_method(rest))
            {
                out.push_str("row.");
                out.push_str(&ident);
            } else {
                out.push_str(&ident);
            }
            continue;
        }

        out.push(c);
        i += 1;
    }

    out
}

fn next_non_space(rest: &[char]) -> Option<char> {
    rest.iter().copied().find(|c| !c.is_whitespace())
}

fn before_comparison(rest: &[char]) -> bool {
    matches!(next_non_space(rest), Some('>' | '<' | '=' | '!' | '≥' | '≤'))
}

fn before_method(rest: &[char]) -> bool {
    let text: String = rest.iter().collect();
    let Some(after) = text.trim_start().strip_prefix('.') else {
        return false;
    };
    let name: String = after
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    (Method::NAMES.contains(&name.as_str()) && after[name.len()..].trim_start().starts_with('('))
        || name == "length"
}
