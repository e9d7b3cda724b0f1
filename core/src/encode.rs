//! Percent-encoding of text for use inside a URL component.

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Percent-encode `input`. Letters, digits and `-` `_` `.` `~` pass through;
/// every other byte becomes `%XX` with uppercase hex.
///
/// The output is at most three times the input length.
pub fn url_encode(input: impl AsRef<[u8]>) -> String {
    let input = input.as_ref();
    let mut encoded = String::with_capacity(input.len() * 3);
    for &byte in input {
        if is_unreserved(byte) {
            encoded.push(char::from(byte));
        } else {
            encoded.push('%');
            encoded.push(char::from(HEX[usize::from(byte >> 4)]));
            encoded.push(char::from(HEX[usize::from(byte & 0x0F)]));
        }
    }
    debug_assert!(encoded.len() <= input.len() * 3);
    encoded
}

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreserved_text_is_unchanged() {
        let text = "AZaz09-_.~";
        assert_eq!(url_encode(text), text);
    }

    #[test]
    fn reserved_bytes_use_uppercase_hex() {
        assert_eq!(url_encode("a b&c=d/e"), "a%20b%26c%3Dd%2Fe");
        assert_eq!(url_encode([0x00u8, 0xFF]), "%00%FF");
    }

    #[test]
    fn multibyte_text_is_encoded_per_byte() {
        assert_eq!(url_encode("é"), "%C3%A9");
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert_eq!(url_encode(""), "");
    }

    #[test]
    fn worst_case_is_three_times_input() {
        let input = "/".repeat(100);
        let encoded = url_encode(&input);
        assert_eq!(encoded.len(), input.len() * 3);
    }
}
