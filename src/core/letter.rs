//! Alphabetical navigation by first letter

use crate::core::condition::{BindValue, Condition};
use crate::core::error::FilterError;

/// Build the prefix match for the selected letter
///
/// A blank letter, or any letter on a table without a letter column, adds
/// nothing. Otherwise anything but exactly one alphabetic character is
/// rejected.
pub fn letter_condition(
    letter: Option<&str>,
    column: Option<&str>,
) -> Result<Option<Condition>, FilterError> {
    let Some(letter) = letter.map(str::trim).filter(|l| !l.is_empty()) else {
        return Ok(None);
    };

    let Some(column) = column else {
        tracing::debug!(letter = %letter, "no letter column configured, ignoring letter");
        return Ok(None);
    };

    let mut chars = letter.chars();
    let ch = match (chars.next(), chars.next()) {
        (Some(ch), None) if ch.is_alphabetic() => ch,
        _ => {
            return Err(FilterError::InvalidLetter {
                value: letter.to_string(),
            });
        }
    };

    Ok(Some(Condition::bound(
        format!("{} ILIKE ?", column),
        vec![BindValue::Text(format!("{}%", ch))],
    )))
}
