//! Cleanup and screening of raw generator output.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::CleanConfig;
use crate::error::ExpressionError;

static PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^expression:\s*").expect("valid regex"));
static OPEN_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^```(?:javascript|js|typescript|ts)?\s*").expect("valid regex")
});
static CLOSE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*```\s*$").expect("valid regex"));
static RETURN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^return\s+").expect("valid regex"));

static FORBIDDEN: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)eval\s*\(",
        r"(?i)function\s*\(",
        r"=>",
        r";\s*\w",
        r"/\*[\s\S]*?\*/",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Strips the wrappers generators put around an expression (`Expression:`
/// labels, code fences, a leading `return`, a trailing `;`) and rejects output
/// that is empty, too short, too long, or contains a forbidden construct.
pub fn clean_generated_expression(
    raw: &str,
    config: &CleanConfig,
) -> Result<String, ExpressionError> {
    let text = PREFIX.replace(raw.trim(), "");
    let text = OPEN_FENCE.replace(&text, "");
    let text = CLOSE_FENCE.replace(&text, "");
    let text = RETURN.replace(text.trim(), "");
    let cleaned = text.trim().trim_end_matches(';').trim_end().to_string();

    if cleaned.is_empty() {
        return Err(ExpressionError::Empty);
    }
    let len = cleaned.chars().count();
    if len < config.min_expression_length {
        return Err(ExpressionError::TooShort(cleaned));
    }
    if len > config.max_expression_length {
        return Err(ExpressionError::TooLong {
            len,
            limit: config.max_expression_length,
        });
    }
    if let Some(found) = FORBIDDEN.iter().find_map(|re| re.find(&cleaned)) {
        return Err(ExpressionError::Unsafe(found.as_str().to_string()));
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(raw: &str) -> Result<String, ExpressionError> {
        clean_generated_expression(raw, &CleanConfig::default())
    }

    #[test]
    fn test_strips_wrappers() {
        assert_eq!(
            clean("Expression: ```javascript\nreturn row.Duration > 3;\n```").unwrap(),
            "row.Duration > 3"
        );
        assert_eq!(clean("  row.A === 'x'  ").unwrap(), "row.A === 'x'");
    }

    #[test]
    fn test_length_limits() {
        assert_eq!(clean("   "), Err(ExpressionError::Empty));
        assert_eq!(clean("```\n```"), Err(ExpressionError::Empty));
        assert_eq!(clean("a>1"), Err(ExpressionError::TooShort("a>1".into())));
        let config = CleanConfig {
            max_expression_length: 10,
            ..Default::default()
        };
        assert!(matches!(
            clean_generated_expression("row.Duration > 3", &config),
            Err(ExpressionError::TooLong { len: 16, limit: 10 })
        ));
    }

    #[test]
    fn test_forbidden_patterns() {
        for raw in [
            "eval('row.A')",
            "(function(){ return true })()",
            "row.A.some(x => x > 1)",
            "row.A > 1; row.B = 2",
            "row.A /* hidden */ > 1",
        ] {
            assert!(
                matches!(clean(raw), Err(ExpressionError::Unsafe(_))),
                "{raw}"
            );
        }
    }
}
