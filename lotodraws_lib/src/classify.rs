//! Draw-name labels to game types.

use crate::types::GameType;

/// Recognized label patterns, matched in order against the normalized label.
///
/// Hour-specific names come before the bare `DIGITAL 1` / `DIGITAL 2`
/// archive labels: "DIGITAL 21H" contains "DIGITAL 2".
const PATTERNS: &[(&str, GameType)] = &[
    ("DIGITAL 00H", GameType::Digital00H),
    ("DIGITAL 21H", GameType::Digital21H),
    ("STAR 11H", GameType::Star11H),
    ("STAR 14H", GameType::Star14H),
    ("STAR 18H", GameType::Star18H),
    ("FORTUNE 11H", GameType::Fortune11H),
    ("FORTUNE 14H", GameType::Fortune14H),
    ("FORTUNE 18H", GameType::Fortune18H),
    ("DIGITAL 1", GameType::Digital1),
    ("DIGITAL 2", GameType::Digital2),
    ("RESULTAT 1", GameType::Result1),
    ("RESULTAT 2", GameType::Result2),
    ("RESULTAT 3", GameType::Result3),
];

/// Uppercase, treat underscores as spaces, collapse whitespace runs.
fn normalize_label(label: &str) -> String {
    label
        .to_uppercase()
        .replace('_', " ")
        .replace('É', "E")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Map a draw label to its game type. First matching pattern wins; `None`
/// means the caller drops the candidate.
pub fn classify(label: &str) -> Option<GameType> {
    let normalized = normalize_label(label);
    PATTERNS
        .iter()
        .find(|(pattern, _)| normalized.contains(pattern))
        .map(|(_, game_type)| *game_type)
}
