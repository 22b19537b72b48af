//! Folder color normalization.
//!
//! Remote folders carry free-form colors set through the bookmark service's
//! own UI. Everything shown or cached goes through [`normalize_color`] so the
//! rest of the crate only ever sees `#rrggbb`.

use crate::constants::DEFAULT_FOLDER_COLOR;

/// Normalize a CSS-style hex color to lowercase `#rrggbb`.
///
/// Accepts `#rgb`, `#rgba`, `#rrggbb` and `#rrggbbaa`; short forms are
/// expanded and the alpha channel is dropped. Anything else maps to
/// [`DEFAULT_FOLDER_COLOR`].
///
/// # Examples
/// ```
/// use wardenview_core::color::normalize_color;
/// assert_eq!(normalize_color("#abc"), "#aabbcc");
/// assert_eq!(normalize_color("#AABBCCDD"), "#aabbcc");
/// assert_eq!(normalize_color("notacolor"), "#0ea5e9");
/// ```
pub fn normalize_color(input: &str) -> String {
    let Some(hex) = input.trim().strip_prefix('#') else {
        return DEFAULT_FOLDER_COLOR.to_string();
    };
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return DEFAULT_FOLDER_COLOR.to_string();
    }
    let hex = hex.to_ascii_lowercase();
    match hex.len() {
        3 | 4 => {
            let mut out = String::with_capacity(7);
            out.push('#');
            for c in hex.chars().take(3) {
                out.push(c);
                out.push(c);
            }
            out
        }
        6 | 8 => format!("#{}", &hex[..6]),
        _ => DEFAULT_FOLDER_COLOR.to_string(),
    }
}

/// Normalize an optional color, treating a missing value as malformed.
pub fn normalize_optional_color(input: Option<&str>) -> String {
    input
        .map(normalize_color)
        .unwrap_or_else(|| DEFAULT_FOLDER_COLOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_short_forms_and_strips_alpha() {
        assert_eq!(normalize_color("#abc"), "#aabbcc");
        assert_eq!(normalize_color("#abcf"), "#aabbcc");
        assert_eq!(normalize_color("#aabbccdd"), "#aabbcc");
        assert_eq!(normalize_color("  #A1B2C3 "), "#a1b2c3");
    }

    #[test]
    fn malformed_values_fall_back_to_default() {
        for value in ["notacolor", "", "#", "#12", "#12345", "#1234567", "#ggg", "abc", "#abc def"] {
            assert_eq!(normalize_color(value), DEFAULT_FOLDER_COLOR, "value: {:?}", value);
        }
        assert_eq!(normalize_optional_color(None), DEFAULT_FOLDER_COLOR);
    }

    #[test]
    fn normalization_is_idempotent() {
        for value in ["#abc", "#ABCD", "#0ea5e9", "#00112233", "junk", "#fff", ""] {
            let once = normalize_color(value);
            assert_eq!(normalize_color(&once), once, "value: {:?}", value);
            assert_eq!(once.len(), 7);
            assert!(once.starts_with('#'));
        }
    }
}
