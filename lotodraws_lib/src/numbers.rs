//! Hyphen-delimited number strings to integer sequences.

/// True for a fragment like `". - . - ."`: every part is empty or a single
/// non-digit filler character.
pub fn is_placeholder(fragment: &str) -> bool {
    fragment.split('-').all(|part| {
        let part = part.trim();
        let mut chars = part.chars();
        match (chars.next(), chars.next()) {
            (None, _) => true,
            (Some(c), None) => !c.is_ascii_digit(),
            _ => false,
        }
    })
}

/// Parse every digit-only part of every fragment, preserving order.
///
/// `["10 - 60 - 13", "31-87"]` gives `[10, 60, 13, 31, 87]`. Placeholder
/// fragments contribute nothing; parts with any non-digit are skipped.
pub fn extract_numbers<S: AsRef<str>>(fragments: &[S]) -> Vec<u32> {
    let mut numbers = Vec::new();
    for fragment in fragments {
        let fragment = fragment.as_ref();
        if is_placeholder(fragment) {
            continue;
        }
        for part in fragment.split('-') {
            let part = part.trim();
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            match part.parse::<u32>() {
                Ok(n) => numbers.push(n),
                Err(e) => tracing::debug!(part, error = %e, "number out of range, skipped"),
            }
        }
    }
    numbers
}
