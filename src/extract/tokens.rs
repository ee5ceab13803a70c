//! Number grammar shared by the extractors.
//!
//! Statistical publications mix absolute counts with period-over-period
//! deltas, percentages and placeholder glyphs. Each text fragment is
//! classified into one [`Token`] so extractors keep only what they need.
//!
//! Thousands separators: `,` `.` `'`, a regular space and the no-break
//! spaces (U+00A0, U+202F), in groups of exactly three digits. A single cell
//! or fragment written `"120 345"` is one count. Free text is split on
//! regular spaces first (see [`tokenize`]), so there it is two.

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Unsigned count, separators removed
    Integer(u64),
    /// Leading `+`, `-`, `±` or `−` (a delta)
    Signed(String),
    /// Contains `%`
    Percent(String),
    /// Unsigned number with a fractional part
    Decimal(f64),
    /// Missing-data glyph such as `-` or `n/a`
    Placeholder,
    Word(String),
}

impl Token {
    pub fn as_integer(&self) -> Option<u64> {
        match self {
            Token::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

const PLACEHOLDERS: &[&str] = &["-", "–", "—", "−", "n/a", "n.a.", "na", "..", "...", "x", "*", "nd"];
const GROUP_SEPARATORS: &[char] = &[',', '.', '\'', ' ', '\u{a0}', '\u{202f}'];

/// Classifies a single whitespace-free fragment.
pub fn classify(text: &str) -> Token {
    let text = text.trim_matches(|c: char| c == ' ' || c == '\t' || c == '\r' || c == '\n');
    let lower = text.to_lowercase();

    if text.is_empty() || PLACEHOLDERS.contains(&lower.as_str()) {
        return Token::Placeholder;
    }
    if text.contains('%') {
        return Token::Percent(text.to_string());
    }

    let mut chars = text.chars();
    if let Some(first) = chars.next() {
        let rest = chars.as_str();
        if matches!(first, '+' | '-' | '±' | '−') && rest.starts_with(|c: char| c.is_ascii_digit()) {
            return Token::Signed(text.to_string());
        }
    }

    if let Some(n) = parse_grouped_integer(text) {
        return Token::Integer(n);
    }
    if let Some(d) = parse_decimal(text) {
        return Token::Decimal(d);
    }
    Token::Word(text.to_string())
}

/// Splits `text` on regular whitespace and classifies every piece.
///
/// A bare `%` following a number turns that number into a percentage, since
/// layout engines often emit the sign as its own fragment.
pub fn tokenize(text: &str) -> Vec<Token> {
    merge_detached_percent(
        text.split([' ', '\t', '\r', '\n'])
            .filter(|p| !p.is_empty())
            .map(classify),
    )
}

/// Tokenizes the text of one positioned fragment.
///
/// The layout engine emits one fragment per cell, so a fragment that is
/// entirely space-grouped digits is read as a single count.
pub fn tokenize_fragment(text: &str) -> Vec<Token> {
    let text = text.trim();
    match parse_grouped_integer(text) {
        Some(n) if text.contains(' ') => vec![Token::Integer(n)],
        _ => tokenize(text),
    }
}

/// Folds a standalone `%` into the number before it.
pub fn merge_detached_percent(tokens: impl IntoIterator<Item = Token>) -> Vec<Token> {
    let mut merged: Vec<Token> = Vec::new();
    for token in tokens {
        if matches!(&token, Token::Percent(p) if p == "%") {
            if let Some(last) = merged.last_mut() {
                if matches!(last, Token::Integer(_) | Token::Decimal(_)) {
                    *last = Token::Percent(format!("{}%", describe(last)));
                    continue;
                }
            }
        }
        merged.push(token);
    }
    merged
}

/// Parses a non-negative count from a table cell.
///
/// Accepts grouped integers and whole decimals (`"1500.0"` from spreadsheet
/// floats). Signed, fractional and textual values yield `None`.
pub fn parse_count(text: &str) -> Option<u64> {
    match classify(text.trim()) {
        Token::Integer(n) => Some(n),
        Token::Decimal(d) if d.fract() == 0.0 && d >= 0.0 => Some(d as u64),
        _ => None,
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Integer(n) => n.to_string(),
        Token::Decimal(d) => d.to_string(),
        Token::Signed(s) | Token::Percent(s) | Token::Word(s) => s.clone(),
        Token::Placeholder => "-".to_string(),
    }
}

fn parse_grouped_integer(text: &str) -> Option<u64> {
    if text.chars().all(|c| c.is_ascii_digit()) {
        return text.parse().ok();
    }

    let separator = text.chars().find(|c| !c.is_ascii_digit())?;
    if !GROUP_SEPARATORS.contains(&separator) {
        return None;
    }
    let groups: Vec<&str> = text.split(separator).collect();
    let (head, tail) = groups.split_first()?;

    let head_ok = (1..=3).contains(&head.len()) && head.chars().all(|c| c.is_ascii_digit());
    let tail_ok = !tail.is_empty()
        && tail
            .iter()
            .all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()));
    if !head_ok || !tail_ok {
        return None;
    }
    groups.concat().parse().ok()
}

fn parse_decimal(text: &str) -> Option<f64> {
    let normalized = text.replacen(',', ".", 1);
    let (whole, fraction) = normalized.split_once('.')?;
    // "1234,567" is a misgrouped count, not a fraction
    if whole.len() > 3 && fraction.len() == 3 {
        return None;
    }
    if whole.is_empty()
        || fraction.is_empty()
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    normalized.parse().ok()
}
