//! Variable-region cursor shared by a message flyweight and its children.
//!
//! A message flyweight owns one [`Cursor`]; its repeating-group and
//! var-data children mutably borrow it for the duration of a call or an
//! iteration. The cursor only moves forward within one encode or decode
//! pass, which keeps the variable region packed and in declaration order.

use crate::error::{Error, Result};

/// Monotonic position pointer over the variable region of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    position: usize,
}

impl Cursor {
    /// Creates a cursor at the given byte position.
    ///
    /// For encode the position starts at `offset + BLOCK_LENGTH`; for
    /// decode at `offset + acting_block_length`.
    #[must_use]
    pub const fn new(position: usize) -> Self {
        Self { position }
    }

    /// Returns the current byte position.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Advances the cursor by `len` bytes, returning the previous
    /// position.
    ///
    /// # Arguments
    /// * `len` - Number of bytes to advance
    #[inline(always)]
    pub fn advance(&mut self, len: usize) -> usize {
        let previous = self.position;
        self.position += len;
        previous
    }

    /// Moves the cursor to an absolute position.
    ///
    /// # Errors
    /// Returns `Error::CursorRetreat` when the target is behind the
    /// current position; bytes already passed are never revisited.
    #[inline]
    pub fn set(&mut self, position: usize) -> Result<()> {
        if position < self.position {
            return Err(Error::CursorRetreat {
                position: self.position,
                attempted: position,
            });
        }
        self.position = position;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_advance() {
        let mut cursor = Cursor::new(8);
        assert_eq!(cursor.position(), 8);

        let previous = cursor.advance(4);
        assert_eq!(previous, 8);
        assert_eq!(cursor.position(), 12);

        let previous = cursor.advance(0);
        assert_eq!(previous, 12);
        assert_eq!(cursor.position(), 12);
    }

    #[test]
    fn test_cursor_set_forward() {
        let mut cursor = Cursor::new(0);
        assert!(cursor.set(16).is_ok());
        assert_eq!(cursor.position(), 16);
        assert!(cursor.set(16).is_ok());
    }

    #[test]
    fn test_cursor_set_backward_rejected() {
        let mut cursor = Cursor::new(10);
        let err = cursor.set(9).unwrap_err();
        assert_eq!(
            err,
            Error::CursorRetreat {
                position: 10,
                attempted: 9,
            }
        );
        assert_eq!(cursor.position(), 10);
    }

    #[test]
    fn test_cursor_monotonic_over_sequence() {
        let mut cursor = Cursor::new(0);
        let mut last = 0;
        for len in [3usize, 0, 7, 1, 12] {
            cursor.advance(len);
            assert!(cursor.position() >= last);
            last = cursor.position();
        }
        assert_eq!(cursor.position(), 23);
    }
}
