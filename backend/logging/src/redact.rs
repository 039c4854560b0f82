//! Log Redaction Layer
//!
//! Scrubs bot tokens and bearer credentials from strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static BOT_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[MNO][A-Za-z\d_-]{23,27}\.[A-Za-z\d_-]{6}\.[A-Za-z\d_-]{27,40}").unwrap()
});
static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(Bot|Bearer)\s+[A-Za-z0-9\-\._~+/]+=*").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = BEARER_RE.replace_all(input, "$1 [REDACTED_TOKEN]");
    BOT_TOKEN_RE.replace_all(&redacted, "[REDACTED_TOKEN]").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction() {
        let token = "MTA5ODc2NTQzMjEwOTg3NjU0Mw.GhIjKl.abcdefghijklmnopqrstuvwxyz0123456789AB";
        let raw = format!("login failed for {token} via Bot {token}");
        let clean = redact_sensitive_data(&raw);
        assert!(!clean.contains(token));
        assert!(clean.contains("Bot [REDACTED_TOKEN]"));
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(redact_sensitive_data("command /ping failed"), "command /ping failed");
    }
}
