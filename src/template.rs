// {{var}} substitution

//! Minimal variable-substitution templating
//!
//! The profile document supports `{{var}}` references; the mutator exposes
//! `name` and `table`. Unknown variables and unterminated `{{` are errors,
//! so a half-expanded profile is never written back.

use anyhow::{bail, Result};

/// Expand `{{var}}` references in `input` from the given variable pairs
pub fn apply_vars(input: &str, vars: &[(&str, String)]) -> Result<String> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let end = match after.find("}}") {
            Some(end) => end,
            None => bail!(
                "unterminated template variable near {:?}",
                truncate(&rest[start..])
            ),
        };

        let key = after[..end].trim();
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => output.push_str(value),
            None => bail!("unknown template variable {:?}", key),
        }

        rest = &after[end + 2..];
    }

    output.push_str(rest);
    Ok(output)
}

fn truncate(s: &str) -> &str {
    match s.char_indices().nth(24) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
