//! # Printer Text
//!
//! Thermal printers render a single-byte code page. Anything outside
//! printable ASCII shows up as garbage on the ticket, so every
//! user-entered string goes through [`normalize_for_printer`] first.
//!
//! ```text
//! "  Canción   del\tMar ☕ "
//!        │ NFD
//!        ▼
//! "  Cancio\u{301}n   del\tMar ☕ "
//!        │ drop combining marks, drop non-printable ASCII
//!        ▼
//! "  Cancion   delMar  "
//!        │ collapse whitespace runs
//!        ▼
//! " Cancion delMar "
//! ```
//!
//! Ends are not trimmed here. Callers that lay out columns trim themselves.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Makes a string safe for a thermal printer.
///
/// Idempotent: `normalize_for_printer(normalize_for_printer(s)) ==
/// normalize_for_printer(s)`.
///
/// ```rust
/// use comanda_core::normalize_for_printer;
///
/// assert_eq!(normalize_for_printer("Canción"), "Cancion");
/// assert_eq!(normalize_for_printer("Jalapeño   extra"), "Jalapeno extra");
/// ```
pub fn normalize_for_printer(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut previous_space = false;

    for c in input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| matches!(*c, ' '..='~'))
    {
        if c == ' ' {
            if previous_space {
                continue;
            }
            previous_space = true;
        } else {
            previous_space = false;
        }
        out.push(c);
    }
    out
}

/// Pads or truncates to exactly `width` characters, left aligned.
///
/// Input is expected to be normalized already, so chars and bytes agree.
pub fn fit_left(text: &str, width: usize) -> String {
    let truncated: String = text.chars().take(width).collect();
    format!("{:<width$}", truncated, width = width)
}

/// Pads or truncates to exactly `width` characters, right aligned.
pub fn fit_right(text: &str, width: usize) -> String {
    let truncated: String = text.chars().take(width).collect();
    format!("{:>width$}", truncated, width = width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_accents() {
        assert_eq!(normalize_for_printer("Canción"), "Cancion");
        assert_eq!(normalize_for_printer("Ñandú"), "Nandu");
        assert_eq!(normalize_for_printer("crème brûlée"), "creme brulee");
    }

    #[test]
    fn test_drops_non_printable() {
        assert_eq!(normalize_for_printer("Café ☕"), "Cafe ");
        assert_eq!(normalize_for_printer("a\u{0007}b"), "ab");
        assert_eq!(normalize_for_printer("日本"), "");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize_for_printer("sin   hielo"), "sin hielo");
        // runs at the ends collapse too, but are kept
        assert_eq!(normalize_for_printer("  sin   hielo  "), " sin hielo ");
        // control whitespace is not printable ASCII and is dropped first
        assert_eq!(normalize_for_printer("sin\thielo"), "sinhielo");
    }

    #[test]
    fn test_idempotent() {
        for s in [
            "Canción",
            "  Jalapeño   extra ",
            "Ñ\u{0301}x\u{0000}y",
            "",
            "ok",
            "Mesa #4 — terraza",
        ] {
            let once = normalize_for_printer(s);
            assert_eq!(normalize_for_printer(&once), once, "input: {:?}", s);
        }
    }

    #[test]
    fn test_output_is_printable_ascii() {
        let out = normalize_for_printer("¡Hola! ¿Qué tal? 10€ «x»");
        assert!(out.bytes().all(|b| (0x20..=0x7E).contains(&b)));
    }

    #[test]
    fn test_fit() {
        assert_eq!(fit_left("Taco", 6), "Taco  ");
        assert_eq!(fit_left("Quesadilla", 6), "Quesad");
        assert_eq!(fit_right("2", 4), "   2");
        assert_eq!(fit_right("123456", 4), "1234");
    }
}
