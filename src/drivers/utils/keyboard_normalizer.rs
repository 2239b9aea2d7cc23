// NOTE: This file maps raw key/button identifiers (as reported by the input
// driver) to the labels shown on chord cards, and ranks those labels so a
// chord always renders modifiers first. It holds no state; the held-key set
// lives in `crate::chord::tracker`.

/// Exact renames, checked before any prefix/suffix rule.
const LABEL_TABLE: &[(&str, &str)] = &[
    ("Left", "LeftClick"),
    ("Right", "RightClick"),
    ("Middle", "WheelClick"),
    ("BackQuote", "`"),
    ("BackSlash", "\\"),
    ("IntlBackslash", "\\"),
    ("Slash", "/"),
    ("Comma", ","),
    ("Dot", "."),
    ("KpDelete", "."),
    ("SemiColon", ";"),
    ("Return", "Enter"),
    ("Quote", "'"),
    ("LeftBracket", "["),
    ("RightBracket", "]"),
    ("Minus", "-"),
    ("KpMinus", "-"),
    ("Equal", "="),
    ("KpPlus", "+"),
    ("KpMultiply", "*"),
    ("KpDivide", "/"),
    ("Lock", "NumLock"),
    ("AltGr", "Alt"),
];

const STRIPPED_PREFIXES: [&str; 3] = ["Key", "Num", "Kp"];
const STRIPPED_SUFFIX: &str = "Arrow";

fn lookup(raw: &str) -> Option<&'static str> {
    LABEL_TABLE
        .iter()
        .find_map(|(from, to)| (*from == raw).then_some(*to))
}

/// Map a raw key or button identifier to its display label.
///
/// Unknown identifiers come back unchanged. The exact table only sees the raw
/// id, so a stripped remainder is never renamed: `KpReturn` reads `Return`
/// and `NumLock` reads `Lock`. A strip that would leave an empty label is
/// skipped.
pub fn label(raw: &str) -> String {
    if let Some(mapped) = lookup(raw) {
        return mapped.to_string();
    }
    if raw.starts_with("Shift") {
        return "Shift".to_string();
    }
    if raw.starts_with("Control") {
        return "Ctrl".to_string();
    }
    if raw.starts_with("Meta") {
        return "Win".to_string();
    }

    let out = STRIPPED_PREFIXES
        .iter()
        .find_map(|prefix| raw.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(raw);
    out.strip_suffix(STRIPPED_SUFFIX)
        .filter(|rest| !rest.is_empty())
        .unwrap_or(out)
        .to_string()
}

/// Sort weight for a display label; higher renders first.
pub fn priority(label: &str) -> i32 {
    if label.starts_with("Ctrl") {
        100
    } else if label.starts_with("Shift") {
        90
    } else if label.ends_with("Alt") || label.ends_with("Win") {
        60
    } else if label.ends_with("Click") {
        50
    } else if label.ends_with("Wheel") {
        30
    } else if !label.is_empty() && label.bytes().all(|b| b.is_ascii_digit()) {
        20
    } else {
        10
    }
}
