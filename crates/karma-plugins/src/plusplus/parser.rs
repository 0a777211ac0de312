//! `++` / `--` command parsing.

use std::sync::LazyLock;

use regex::Regex;

/// Cheap check run before the full parse.
static AWARD_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+\+|--|\x{2013}|\x{2014}").expect("static regex"));

// Names are ASCII word runs; the directory's LIKE tiers only fold ASCII case.
static PLUS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s\+\+\s*@?((?-u:\w)+)|@?((?-u:\w)+)\s*\+\+\s").expect("static regex")
});

static MINUS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s--\s*@?((?-u:\w)+)|@?((?-u:\w)+)\s*--\s").expect("static regex")
});

/// Result of parsing one message for an award command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwardParse {
    /// Exactly one of `++` / `--` matched.
    Command { to_name: String, delta: i64 },
    /// Both `++` and `--` matched; the message is left alone.
    Ambiguous,
    /// No award token.
    None,
}

/// Returns `true` if `text` could possibly hold an award token.
pub fn has_award_token(text: &str) -> bool {
    AWARD_HINT.is_match(text)
}

/// Parses `text` for a single `name++` / `++name` / `name--` / `--name`.
///
/// En and em dashes count as `--`, since chat clients like to replace a
/// double hyphen with one of them.
pub fn parse_award_command(text: &str) -> AwardParse {
    let normalized = text.replace(['\u{2013}', '\u{2014}'], "--");
    let padded = format!(" {normalized} ");

    let plus = first_name(&PLUS_PATTERN, &padded);
    let minus = first_name(&MINUS_PATTERN, &padded);

    match (plus, minus) {
        (Some(_), Some(_)) => AwardParse::Ambiguous,
        (Some(to_name), None) => AwardParse::Command { to_name, delta: 1 },
        (None, Some(to_name)) => AwardParse::Command { to_name, delta: -1 },
        (None, None) => AwardParse::None,
    }
}

fn first_name(pattern: &Regex, text: &str) -> Option<String> {
    let caps = pattern.captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}
