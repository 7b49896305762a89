//! Byte-string scanning
//!
//! A byte string is a slice whose logical content ends at the first null
//! byte (0). Slices without a null byte are treated as ending at the slice
//! end, so callers never read past the memory they own.

const LO_BITS: u64 = 0x0101_0101_0101_0101;
const HI_BITS: u64 = 0x8080_8080_8080_8080;
const WORD: usize = size_of::<u64>();

#[inline(always)]
fn has_zero_byte(x: u64) -> bool {
    (x.wrapping_sub(LO_BITS) & !x & HI_BITS) != 0
}

#[inline(always)]
fn find_nul(bytes: &[u8]) -> Option<usize> {
    bytes.iter().position(|&b| b == 0)
}

/// Calculate the length of a null-terminated string
///
/// Returns the number of bytes before the first null byte (0).
/// If no null byte is found, returns the length of the slice.
///
/// # Examples
/// ```
/// use strconcat::str::strlen;
/// assert_eq!(strlen(b"hello\0world"), 5);
/// assert_eq!(strlen(b"\0"), 0);
/// assert_eq!(strlen(b"hello"), 5); // no null terminator
/// ```
pub fn strlen(s: &[u8]) -> usize {
    let mut words = s.chunks_exact(WORD);
    let mut offset = 0usize;

    for chunk in &mut words {
        let mut word = [0u8; WORD];
        word.copy_from_slice(chunk);
        if has_zero_byte(u64::from_ne_bytes(word)) {
            // The word test has no false positives, so the byte is in this chunk.
            return offset + find_nul(chunk).unwrap_or(WORD);
        }
        offset += WORD;
    }

    offset + find_nul(words.remainder()).unwrap_or(words.remainder().len())
}

/// Calculate bounded length of a null-terminated string
///
/// Returns the number of bytes before the first null byte, but at most `maxlen`.
///
/// # Examples
/// ```
/// use strconcat::str::strnlen;
/// assert_eq!(strnlen(b"hello\0world", 10), 5);
/// assert_eq!(strnlen(b"hello", 3), 3);
/// ```
pub fn strnlen(s: &[u8], maxlen: usize) -> usize {
    strlen(&s[..s.len().min(maxlen)])
}

/// The logical content of a byte string, without its terminator.
///
/// # Examples
/// ```
/// use strconcat::str::content;
/// assert_eq!(content(b"abc\0def"), b"abc");
/// ```
pub fn content(s: &[u8]) -> &[u8] {
    &s[..strlen(s)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strlen_empty() {
        assert_eq!(strlen(b""), 0);
        assert_eq!(strlen(b"\0"), 0);
    }

    #[test]
    fn test_strlen_every_nul_position() {
        // Exercises the word loop, the in-word search, and the tail.
        for len in 0..40usize {
            for nul in 0..len {
                let mut buf = vec![b'x'; len];
                buf[nul] = 0;
                assert_eq!(strlen(&buf), nul, "len={len} nul={nul}");
            }
            assert_eq!(strlen(&vec![b'x'; len]), len);
        }
    }

    #[test]
    fn test_strlen_high_bytes_are_not_terminators() {
        let buf = [0x80u8, 0xFF, 0x81, 0x7F, 0x01, 0xFE, 0x80, 0x80, 0x90, 0];
        assert_eq!(strlen(&buf), 9);
    }

    #[test]
    fn test_strnlen_limit() {
        assert_eq!(strnlen(b"hello\0", 0), 0);
        assert_eq!(strnlen(b"hello\0", 100), 5);
        assert_eq!(strnlen(b"hello world", 8), 8);
    }

    #[test]
    fn test_content_stops_at_first_nul() {
        assert_eq!(content(b"ab\0cd\0"), b"ab");
        assert_eq!(content(b"abc"), b"abc");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn strlen_matches_linear_scan(bytes in proptest::collection::vec(any::<u8>(), 0..300)) {
                let expected = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                prop_assert_eq!(strlen(&bytes), expected);
            }
        }
    }
}
