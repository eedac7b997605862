//! Identity-field normalization
//!
//! Names and institution names arrive from two independently curated
//! sources with inconsistent casing and accents. Both sides are folded to
//! the same comparable form before any join:
//!
//! - lower-case
//! - accented Latin vowels, `ñ` and `ç` folded to their base letter
//!
//! Nothing else is altered; punctuation, digits and other scripts pass
//! through unchanged.

use crate::{Result, Table};

/// Fold one accented (already lower-cased) character to its base letter
fn fold_char(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ä' | 'ã' | 'å' | 'æ' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'ö' | 'õ' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Lower-case and strip diacritics from the supported Latin letters
///
/// Applying this twice yields the same result as applying it once.
pub fn fold_text(text: &str) -> String {
    text.to_lowercase().chars().map(fold_char).collect()
}

/// Rewrite a free-text column of `table` in place with [`fold_text`]
///
/// # Errors
/// `Error::MissingColumn` when the column does not exist.
pub fn normalize_column(table: &mut Table, column: &str) -> Result<()> {
    table.map_column(column, fold_text)
}

/// Full-name comparison form: hyphens become spaces
pub fn name_key(name: &str) -> String {
    name.replace('-', " ")
}

/// First whitespace-delimited token of a name, empty for an empty name
pub fn first_token(name: &str) -> String {
    name.split_whitespace().next().unwrap_or_default().to_string()
}
