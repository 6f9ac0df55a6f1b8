// Escape/unescape helpers for URI components

use crate::error::{Error, Result};

/// Decodes URI percent-encoding (%HH) within a byte slice.
///
/// Returns the decoded text, or [`Error::MalformedUri`] positioned at the
/// offending escape sequence.
pub fn unescape_uri_component(input: &[u8]) -> Result<String> {
    let mut unescaped: Vec<u8> = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        match input[i] {
            b'%' => {
                if i + 2 < input.len() {
                    let h1 = input[i + 1];
                    let h2 = input[i + 2];
                    if let (Some(v1), Some(v2)) = (hex_val(h1), hex_val(h2)) {
                        unescaped.push((v1 << 4) | v2);
                        i += 3;
                    } else {
                        return Err(Error::MalformedUri {
                            offset: i,
                            message: format!("invalid hex sequence: %{}{}", h1 as char, h2 as char),
                        });
                    }
                } else {
                    return Err(Error::MalformedUri {
                        offset: i,
                        message: "incomplete escape sequence at end of input".to_string(),
                    });
                }
            }
            _ => {
                unescaped.push(input[i]);
                i += 1;
            }
        }
    }

    String::from_utf8(unescaped).map_err(|e| Error::MalformedUri {
        offset: e.utf8_error().valid_up_to(),
        message: "UTF-8 error after URI unescaping".to_string(),
    })
}

/// Percent-encodes every byte outside the unreserved set.
///
/// The inverse of [`unescape_uri_component`] for text that must travel
/// inside a user, password, or parameter-value token.
pub fn escape_uri_component(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 3);

    for c in s.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' |
            '-' | '_' | '.' | '!' | '~' | '*' | '\'' | '(' | ')' | '+' => {
                result.push(c);
            }
            _ => {
                for byte in c.to_string().bytes() {
                    result.push('%');
                    result.push_str(&format!("{:02X}", byte));
                }
            }
        }
    }

    result
}

// Helper to convert a hex character (byte) to its value (0-15)
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape_uri_component() {
        assert_eq!(unescape_uri_component(b"simple").unwrap(), "simple");
        assert_eq!(unescape_uri_component(b"%20").unwrap(), " ");
        assert_eq!(unescape_uri_component(b"a%20b%20c").unwrap(), "a b c");
        assert_eq!(unescape_uri_component(b"%41%42%43").unwrap(), "ABC");
        assert_eq!(unescape_uri_component(b"%c3%a9").unwrap(), "é"); // UTF-8
        assert_eq!(unescape_uri_component(b"%25").unwrap(), "%"); // Escaped percent
    }

    #[test]
    fn test_unescape_uri_component_invalid() {
        assert!(unescape_uri_component(b"%").is_err()); // Incomplete
        assert!(unescape_uri_component(b"%2").is_err()); // Incomplete
        assert!(unescape_uri_component(b"%G0").is_err()); // Invalid hex
        assert!(unescape_uri_component(b"%2G").is_err()); // Invalid hex
        assert!(unescape_uri_component(b"%AF%").is_err()); // Incomplete at end
        // Invalid UTF-8 after decoding
        assert!(unescape_uri_component(b"%C0%80").is_err());
    }

    #[test]
    fn test_unescape_error_offset() {
        match unescape_uri_component(b"ok%ZZ") {
            Err(Error::MalformedUri { offset, .. }) => assert_eq!(offset, 2),
            other => panic!("expected MalformedUri, got {:?}", other),
        }
    }

    #[test]
    fn test_escape_uri_component() {
        assert_eq!(escape_uri_component("simple"), "simple");
        assert_eq!(escape_uri_component("a b"), "a%20b");
        assert_eq!(escape_uri_component("user@host"), "user%40host");
        assert_eq!(escape_uri_component("p;q=r"), "p%3Bq%3Dr");
    }

    #[test]
    fn test_escape_unescape_inverse() {
        let original = "alice smith@example.com;x=1";
        let escaped = escape_uri_component(original);
        assert_eq!(unescape_uri_component(escaped.as_bytes()).unwrap(), original);
    }
}
