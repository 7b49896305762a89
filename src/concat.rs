//! Concatenation of two byte strings into a freshly allocated buffer.
//!
//! Every result is null-terminated and owned by the caller. Inputs are read
//! up to their first null byte (or slice end) and are never modified.

use crate::error::{ConcatError, Operand};
use crate::str::strlen;

/// Resolve both operands, reporting the first absent one.
pub(crate) fn operands<'a>(
    str1: Option<&'a [u8]>,
    str2: Option<&'a [u8]>,
) -> Result<(&'a [u8], &'a [u8]), ConcatError> {
    match (str1, str2) {
        (Some(a), Some(b)) => Ok((a, b)),
        (None, _) => Err(ConcatError::MissingInput {
            operand: Operand::First,
        }),
        (Some(_), None) => Err(ConcatError::MissingInput {
            operand: Operand::Second,
        }),
    }
}

/// Size of the terminated result for contents of `len1` and `len2` bytes.
pub(crate) fn terminated_len(len1: usize, len2: usize) -> Result<usize, ConcatError> {
    len1.checked_add(len2)
        .and_then(|n| n.checked_add(1))
        .ok_or(ConcatError::LengthOverflow)
}

/// Write `a`, then `b`, then the terminator into `dest`.
///
/// `dest` must be exactly `a.len() + b.len() + 1` bytes long.
pub(crate) fn fill_terminated(dest: &mut [u8], a: &[u8], b: &[u8]) {
    let (head, rest) = dest.split_at_mut(a.len());
    let (tail, nul) = rest.split_at_mut(b.len());
    head.copy_from_slice(a);
    tail.copy_from_slice(b);
    nul.fill(0);
}

/// Size of `concat(str1, str2)`, terminator included.
///
/// Returns `None` if the size does not fit in `usize`.
///
/// # Examples
/// ```
/// use strconcat::concat::concat_len;
/// assert_eq!(concat_len(b"hello\0", b"world\0"), Some(11));
/// assert_eq!(concat_len(b"", b""), Some(1));
/// ```
pub fn concat_len(str1: &[u8], str2: &[u8]) -> Option<usize> {
    terminated_len(strlen(str1), strlen(str2)).ok()
}

/// Concatenate two byte strings into a new null-terminated buffer.
///
/// Returns `None` if either input is absent or the allocation fails. No
/// allocation happens on the absent-input path.
///
/// # Examples
/// ```
/// use strconcat::concat::concat;
/// assert_eq!(concat(Some(b"hello\0"), Some(b"world\0")).as_deref(), Some(&b"helloworld\0"[..]));
/// assert_eq!(concat(None, Some(b"world\0")), None);
/// ```
pub fn concat(str1: Option<&[u8]>, str2: Option<&[u8]>) -> Option<Vec<u8>> {
    try_concat(str1, str2).ok()
}

/// Like [`concat`], but reports why the result is absent.
///
/// # Examples
/// ```
/// use strconcat::concat::try_concat;
/// use strconcat::error::{ConcatError, Operand};
///
/// let err = try_concat(Some(b"a"), None).unwrap_err();
/// assert!(matches!(err, ConcatError::MissingInput { operand: Operand::Second }));
/// ```
pub fn try_concat(str1: Option<&[u8]>, str2: Option<&[u8]>) -> Result<Vec<u8>, ConcatError> {
    let (a, b) = operands(str1, str2)?;
    let mut out = Vec::new();
    concat_into(&mut out, a, b)?;
    Ok(out)
}

/// Concatenate into `dest`, reusing its capacity.
///
/// `dest` is cleared first. On success it holds the terminated result and
/// the logical length (terminator excluded) is returned. On failure `dest`
/// is left empty.
///
/// # Examples
/// ```
/// use strconcat::concat::concat_into;
/// let mut buf = Vec::with_capacity(32);
/// assert_eq!(concat_into(&mut buf, b"foo\0", b"bar\0")?, 6);
/// assert_eq!(buf, b"foobar\0");
/// # Ok::<(), strconcat::error::ConcatError>(())
/// ```
pub fn concat_into(dest: &mut Vec<u8>, str1: &[u8], str2: &[u8]) -> Result<usize, ConcatError> {
    dest.clear();

    let len1 = strlen(str1);
    let len2 = strlen(str2);
    let total = terminated_len(len1, len2)?;

    reserve_exact(dest, total)?;
    dest.extend_from_slice(&str1[..len1]);
    dest.extend_from_slice(&str2[..len2]);
    dest.push(0);

    Ok(len1 + len2)
}

fn reserve_exact(dest: &mut Vec<u8>, total: usize) -> Result<(), ConcatError> {
    dest.try_reserve_exact(total)
        .map_err(|e| ConcatError::alloc_failed(total, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_hello_world() {
        assert_eq!(
            concat(Some(b"hello\0"), Some(b"world\0")).unwrap(),
            b"helloworld\0"
        );
    }

    #[test]
    fn test_concat_absent_inputs() {
        assert_eq!(concat(None, Some(b"world\0")), None);
        assert_eq!(concat(Some(b"hello\0"), None), None);
        assert_eq!(concat(None, None), None);
    }

    #[test]
    fn test_concat_empty_strings() {
        assert_eq!(concat(Some(b"\0"), Some(b"\0")).unwrap(), b"\0");
        assert_eq!(concat(Some(b""), Some(b"")).unwrap(), b"\0");
        assert_eq!(concat(Some(b"\0"), Some(b"world\0")).unwrap(), b"world\0");
        assert_eq!(concat(Some(b"hello\0"), Some(b"\0")).unwrap(), b"hello\0");
    }

    #[test]
    fn test_concat_stops_at_first_nul() {
        assert_eq!(
            concat(Some(b"ab\0ignored"), Some(b"cd\0also")).unwrap(),
            b"abcd\0"
        );
    }

    #[test]
    fn test_concat_unterminated_inputs() {
        assert_eq!(concat(Some(b"ab"), Some(b"cd")).unwrap(), b"abcd\0");
    }

    #[test]
    fn test_concat_opaque_bytes() {
        let a = [0xFFu8, 0xC3, 0x28, 0];
        let b = [0x80u8, 0x01, 0];
        assert_eq!(
            concat(Some(&a), Some(&b)).unwrap(),
            [0xFF, 0xC3, 0x28, 0x80, 0x01, 0]
        );
    }

    #[test]
    fn test_concat_does_not_alias_inputs() {
        let a = b"left\0".to_vec();
        let b = b"right\0".to_vec();
        let mut out = concat(Some(&a), Some(&b)).unwrap();
        assert_ne!(out.as_ptr(), a.as_ptr());
        assert_ne!(out.as_ptr(), b.as_ptr());

        out[0] = b'L';
        assert_eq!(a, b"left\0");
        assert_eq!(out, b"Leftright\0");
    }

    #[test]
    fn test_try_concat_reports_operand() {
        let err = try_concat(None, None).unwrap_err();
        assert!(matches!(
            err,
            ConcatError::MissingInput {
                operand: Operand::First
            }
        ));
        let err = try_concat(Some(b"a\0"), None).unwrap_err();
        assert!(matches!(
            err,
            ConcatError::MissingInput {
                operand: Operand::Second
            }
        ));
    }

    #[test]
    fn test_terminated_len_overflow() {
        assert!(matches!(
            terminated_len(usize::MAX, 0),
            Err(ConcatError::LengthOverflow)
        ));
        assert!(matches!(
            terminated_len(usize::MAX - 1, 1),
            Err(ConcatError::LengthOverflow)
        ));
        assert_eq!(terminated_len(2, 3).unwrap(), 6);
    }

    #[test]
    fn test_reserve_exact_failure_is_alloc_failed() {
        let mut buf = Vec::new();
        let err = reserve_exact(&mut buf, usize::MAX).unwrap_err();
        assert!(matches!(
            err,
            ConcatError::AllocFailed {
                requested: usize::MAX,
                source: Some(_)
            }
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_concat_into_reuses_buffer() {
        let mut buf = b"stale contents".to_vec();
        let len = concat_into(&mut buf, b"x\0", b"yz\0").unwrap();
        assert_eq!(len, 3);
        assert_eq!(buf, b"xyz\0");
    }

    #[test]
    fn test_fill_terminated_layout() {
        let mut dest = [0xAAu8; 6];
        fill_terminated(&mut dest, b"abc", b"de");
        assert_eq!(&dest, b"abcde\0");
    }

    #[test]
    fn test_concat_len() {
        assert_eq!(concat_len(b"abc\0", b"de"), Some(6));
        assert_eq!(concat_len(b"\0", b"\0"), Some(1));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_cstr() -> impl Strategy<Value = Vec<u8>> {
            proptest::collection::vec(1u8..=255, 0..128).prop_map(|mut v| {
                v.push(0);
                v
            })
        }

        proptest! {
            #[test]
            fn result_is_a_then_b_then_nul(a in arb_cstr(), b in arb_cstr()) {
                let len_a = a.len() - 1;
                let len_b = b.len() - 1;
                let out = concat(Some(&a), Some(&b)).unwrap();

                prop_assert_eq!(out.len(), len_a + len_b + 1);
                prop_assert_eq!(&out[..len_a], &a[..len_a]);
                prop_assert_eq!(&out[len_a..len_a + len_b], &b[..len_b]);
                prop_assert_eq!(out[len_a + len_b], 0);
                prop_assert_eq!(strlen(&out), len_a + len_b);
            }

            #[test]
            fn absent_operand_is_always_absent(a in arb_cstr()) {
                prop_assert!(concat(None, Some(&a)).is_none());
                prop_assert!(concat(Some(&a), None).is_none());
            }
        }
    }
}
