// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Denylist stripping of markup from free-text project fields.
//!
//! Removes `<`, `>`, `javascript:` and inline handler patterns (`on…=`),
//! case-insensitively, then trims. This is a narrow filter applied before
//! persistence; rendering code must still encode output.

const JAVASCRIPT_URI: &[u8] = b"javascript:";

/// Strip dangerous patterns from `input`.
pub fn sanitize_rich_text(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    let mut copied_from = 0;

    while i < bytes.len() {
        let skip = match bytes[i] {
            b'<' | b'>' => Some(1),
            _ if starts_with_ignore_case(&bytes[i..], JAVASCRIPT_URI) => Some(JAVASCRIPT_URI.len()),
            _ => handler_attribute_len(&bytes[i..]),
        };

        match skip {
            Some(len) => {
                out.push_str(&input[copied_from..i]);
                i += len;
                copied_from = i;
            }
            None => i += 1,
        }
    }
    out.push_str(&input[copied_from..]);

    out.trim().to_string()
}

fn starts_with_ignore_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && haystack[..needle.len()].eq_ignore_ascii_case(needle)
}

/// Length of an `on<non-space>+=` match at the start of `s`, if any.
///
/// The non-space run is greedy, so the match ends at the last `=` before the
/// next whitespace.
fn handler_attribute_len(s: &[u8]) -> Option<usize> {
    if !starts_with_ignore_case(s, b"on") {
        return None;
    }
    let run_end = s
        .iter()
        .skip(2)
        .position(|b| b.is_ascii_whitespace())
        .map_or(s.len(), |p| p + 2);

    // At least one character must sit between "on" and "=".
    let eq = s[3.min(run_end)..run_end].iter().rposition(|&b| b == b'=')?;
    Some(3 + eq + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_angle_brackets() {
        let cleaned = sanitize_rich_text("<script>alert(1)</script>");
        assert!(!cleaned.contains('<'));
        assert!(!cleaned.contains('>'));
        assert_eq!(cleaned, "scriptalert(1)/script");
    }

    #[test]
    fn strips_javascript_uri_case_insensitively() {
        assert_eq!(sanitize_rich_text("JavaScript:alert(1)"), "alert(1)");
    }

    #[test]
    fn strips_inline_handlers() {
        assert_eq!(
            sanitize_rich_text("<img src=x onerror=alert(1)>"),
            "img src=x alert(1)"
        );
        assert_eq!(sanitize_rich_text("x ONCLICK=go()"), "x go()");
    }

    #[test]
    fn leaves_ordinary_text_alone() {
        assert_eq!(
            sanitize_rich_text("  Amazon reforestation, phase one  "),
            "Amazon reforestation, phase one"
        );
        assert_eq!(sanitize_rich_text("person=x"), "person=x");
    }

    #[test]
    fn handles_multibyte_text() {
        assert_eq!(sanitize_rich_text("Forêt <b>été</b>"), "Forêt bété/b");
    }
}
