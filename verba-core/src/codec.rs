//! Byte-exact encoding of a word's coefficient vectors.
//!
//! ## Wire layout
//!
//! ```text
//! [count: u64 LE]                      number of coefficient vectors
//! if count > 0:
//!   [vec_len: u64 LE]                  shared length of every vector
//!   if vec_len > 0:
//!     count × vec_len × [f64 LE]       values in row-major order
//! ```
//!
//! Counts are fixed 8-byte little-endian integers and doubles travel as
//! their IEEE-754 bit pattern via `to_le_bytes`, so the format is identical
//! on every platform. Decoding validates the remaining length before every
//! field and never reads past the supplied buffer.

use crate::clip::Word;
use crate::error::{Result, VerbaError};

const COUNT_BYTES: usize = 8;
const VALUE_BYTES: usize = 8;

/// Serialize `word` into a flat byte buffer.
///
/// # Errors
/// `VerbaError::MismatchedVectors` when the word's coefficient vectors do
/// not all share one length.
pub fn encode_word(word: &Word) -> Result<Vec<u8>> {
    let count = word.coeff_vectors.len();
    let vec_len = word.vector_size().unwrap_or(0);

    let mut out = Vec::with_capacity(COUNT_BYTES * 2 + count * vec_len * VALUE_BYTES);
    out.extend_from_slice(&(count as u64).to_le_bytes());
    if count == 0 {
        return Ok(out);
    }

    out.extend_from_slice(&(vec_len as u64).to_le_bytes());
    for vector in &word.coeff_vectors {
        if vector.len() != vec_len {
            return Err(VerbaError::MismatchedVectors);
        }
        for value in vector {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }

    Ok(out)
}

/// Deserialize a buffer produced by [`encode_word`].
///
/// # Errors
/// `VerbaError::CorruptWord` when the buffer ends before a declared field.
pub fn decode_word(bytes: &[u8]) -> Result<Word> {
    let mut reader = Reader { bytes };

    let count = reader.read_u64()? as usize;
    if count == 0 {
        return Ok(Word::default());
    }

    let vec_len = reader.read_u64()? as usize;
    if vec_len == 0 {
        return Ok(Word::new(vec![Vec::new(); count]));
    }

    let needed = count
        .saturating_mul(vec_len)
        .saturating_mul(VALUE_BYTES);
    if reader.bytes.len() < needed {
        return Err(VerbaError::CorruptWord {
            expected: needed,
            actual: reader.bytes.len(),
        });
    }

    let mut coeff_vectors = Vec::with_capacity(count);
    for _ in 0..count {
        let mut vector = Vec::with_capacity(vec_len);
        for _ in 0..vec_len {
            vector.push(reader.read_f64()?);
        }
        coeff_vectors.push(vector);
    }

    Ok(Word::new(coeff_vectors))
}

/// Cursor over the undecoded tail of the input buffer.
struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.bytes.len() < n {
            return Err(VerbaError::CorruptWord {
                expected: n,
                actual: self.bytes.len(),
            });
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        Ok(head)
    }

    fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; COUNT_BYTES];
        buf.copy_from_slice(self.take(COUNT_BYTES)?);
        Ok(u64::from_le_bytes(buf))
    }

    fn read_f64(&mut self) -> Result<f64> {
        let mut buf = [0u8; VALUE_BYTES];
        buf.copy_from_slice(self.take(VALUE_BYTES)?);
        Ok(f64::from_le_bytes(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(vectors: &[&[f64]]) -> Word {
        Word::new(vectors.iter().map(|v| v.to_vec()).collect())
    }

    #[test]
    fn round_trip() {
        let original = word(&[&[1.0, 2.0, 3.0], &[-4.5, 0.0, f64::MIN_POSITIVE]]);
        let bytes = encode_word(&original).unwrap();
        assert_eq!(decode_word(&bytes).unwrap(), original);
    }

    #[test]
    fn round_trip_empty_word() {
        let original = Word::default();
        let bytes = encode_word(&original).unwrap();
        assert_eq!(bytes.len(), 8);
        assert_eq!(decode_word(&bytes).unwrap(), original);
    }

    #[test]
    fn round_trip_zero_length_vectors() {
        let original = word(&[&[], &[], &[]]);
        let bytes = encode_word(&original).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(decode_word(&bytes).unwrap(), original);
    }

    #[test]
    fn encoding_is_deterministic_with_exact_length() {
        let w = word(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let bytes = encode_word(&w).unwrap();
        assert_eq!(bytes.len(), 8 + 8 + 2 * 2 * 8);
        assert_eq!(bytes, encode_word(&w).unwrap());
    }

    #[test]
    fn two_by_two_word_has_the_expected_bytes() {
        let w = word(&[&[1.0, 2.0], &[3.0, 4.0]]);

        let mut expected = Vec::new();
        expected.extend_from_slice(&2u64.to_le_bytes());
        expected.extend_from_slice(&2u64.to_le_bytes());
        for value in [1.0f64, 2.0, 3.0, 4.0] {
            expected.extend_from_slice(&value.to_le_bytes());
        }
        assert_eq!(expected.len(), 48);

        let bytes = encode_word(&w).unwrap();
        assert_eq!(bytes, expected);
        assert_eq!(decode_word(&bytes).unwrap(), w);
    }

    #[test]
    fn mismatched_vectors_are_rejected() {
        let w = word(&[&[1.0, 2.0], &[3.0]]);
        assert!(matches!(
            encode_word(&w),
            Err(VerbaError::MismatchedVectors)
        ));
    }

    #[test]
    fn truncated_count_is_corrupt() {
        assert!(matches!(
            decode_word(&[0u8; 4]),
            Err(VerbaError::CorruptWord { .. })
        ));
        assert!(decode_word(&[]).is_err());
    }

    #[test]
    fn missing_vector_length_is_corrupt() {
        let bytes = 1u64.to_le_bytes();
        assert!(matches!(
            decode_word(&bytes),
            Err(VerbaError::CorruptWord { .. })
        ));
    }

    #[test]
    fn truncated_values_are_corrupt() {
        // Declares 2×2 doubles but carries only three.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2u64.to_le_bytes());
        bytes.extend_from_slice(&2u64.to_le_bytes());
        for value in [1.0f64, 2.0, 3.0] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        assert!(matches!(
            decode_word(&bytes),
            Err(VerbaError::CorruptWord {
                expected: 32,
                actual: 24
            })
        ));
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let w = word(&[&[7.0]]);
        let mut bytes = encode_word(&w).unwrap();
        bytes.extend_from_slice(&[0xFF; 3]);
        assert_eq!(decode_word(&bytes).unwrap(), w);
    }
}
