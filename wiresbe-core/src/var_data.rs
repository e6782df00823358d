//! Length-prefixed variable-data accessors.
//!
//! A var-data field is an unsigned length prefix followed by that many
//! raw bytes. The prefix width (1, 2, or 4 bytes) is declared by the
//! schema's var-data encoding composite; nothing here guesses it - the
//! caller picks the matching `_u8`/`_u16`/`_u32` family. Prefixes are
//! little-endian.
//!
//! All operations thread the parent message's [`Cursor`], so var-data
//! fields stay packed in declaration order.

use crate::bounds;
use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::cursor::Cursor;
use crate::error::{Error, Result};

macro_rules! impl_var_data {
    (
        $prefix_ty:ty,
        $prefix_len:expr,
        $get_prefix:ident,
        $put_prefix:ident,
        $put:ident,
        $get:ident,
        $copy:ident,
        $length:ident,
        $doc_width:literal
    ) => {
        #[doc = concat!("Writes a var-data field with a ", $doc_width, " length prefix.")]
        ///
        /// The prefix is written at the cursor, then the payload; the
        /// cursor ends just past the payload.
        ///
        /// # Errors
        /// `Error::ValueOutOfRange` when the payload length exceeds the
        /// prefix type's maximum; `Error::BufferTooShort` when prefix
        /// plus payload do not fit.
        pub fn $put<B: WriteBuffer + ?Sized>(
            buffer: &mut B,
            cursor: &mut Cursor,
            src: &[u8],
        ) -> Result<()> {
            if src.len() > <$prefix_ty>::MAX as usize {
                return Err(Error::ValueOutOfRange {
                    value: src.len() as i128,
                    min: 0,
                    max: <$prefix_ty>::MAX as i128,
                });
            }
            bounds::check(buffer.len(), cursor.position(), $prefix_len + src.len())?;
            buffer.$put_prefix(cursor.position(), src.len() as $prefix_ty);
            cursor.advance($prefix_len);
            let pos = cursor.advance(src.len());
            buffer.put_bytes(pos, src);
            Ok(())
        }

        #[doc = concat!("Reads a var-data field with a ", $doc_width, " length prefix, zero-copy.")]
        ///
        /// Returns a view over the payload bytes; the cursor ends just
        /// past them.
        ///
        /// # Errors
        /// `Error::BufferTooShort` when the prefix or payload crosses the
        /// end of the buffer.
        pub fn $get<'a, B: ReadBuffer + ?Sized>(
            buffer: &'a B,
            cursor: &mut Cursor,
        ) -> Result<&'a [u8]> {
            bounds::check(buffer.len(), cursor.position(), $prefix_len)?;
            let len = buffer.$get_prefix(cursor.position()) as usize;
            cursor.advance($prefix_len);
            bounds::check(buffer.len(), cursor.position(), len)?;
            let pos = cursor.advance(len);
            Ok(buffer.get_bytes(pos, len))
        }

        #[doc = concat!("Copies a var-data field with a ", $doc_width, " length prefix into `dst`.")]
        ///
        /// Copies at most `dst.len()` bytes and returns the number
        /// copied. The cursor still advances past the full payload, so a
        /// clamped read never desynchronizes subsequent fields.
        ///
        /// # Errors
        /// `Error::BufferTooShort` when the prefix or payload crosses the
        /// end of the buffer.
        pub fn $copy<B: ReadBuffer + ?Sized>(
            buffer: &B,
            cursor: &mut Cursor,
            dst: &mut [u8],
        ) -> Result<usize> {
            let data = $get(buffer, cursor)?;
            let n = data.len().min(dst.len());
            dst[..n].copy_from_slice(&data[..n]);
            Ok(n)
        }

        #[doc = concat!("Peeks the length of a var-data field with a ", $doc_width, " prefix.")]
        ///
        /// Does not advance the cursor.
        ///
        /// # Errors
        /// `Error::BufferTooShort` when the prefix crosses the end of the
        /// buffer.
        pub fn $length<B: ReadBuffer + ?Sized>(buffer: &B, cursor: &Cursor) -> Result<usize> {
            bounds::check(buffer.len(), cursor.position(), $prefix_len)?;
            Ok(buffer.$get_prefix(cursor.position()) as usize)
        }
    };
}

// u8 prefix reads/writes go through get_u8/put_u8 directly.
impl_var_data!(u8, 1, get_u8, put_u8, put_u8_prefixed, get_u8_prefixed, copy_u8_prefixed, length_u8_prefixed, "1-byte");
impl_var_data!(u16, 2, get_u16_le, put_u16_le, put_u16_prefixed, get_u16_prefixed, copy_u16_prefixed, length_u16_prefixed, "2-byte");
impl_var_data!(u32, 4, get_u32_le, put_u32_le, put_u32_prefixed, get_u32_prefixed, copy_u32_prefixed, length_u32_prefixed, "4-byte");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u16_round_trip() {
        let mut buf = vec![0u8; 32];
        let mut cursor = Cursor::new(0);
        put_u16_prefixed(&mut buf, &mut cursor, b"Honda").unwrap();
        assert_eq!(cursor.position(), 7);

        let mut cursor = Cursor::new(0);
        assert_eq!(length_u16_prefixed(&buf, &cursor).unwrap(), 5);
        let data = get_u16_prefixed(&buf, &mut cursor).unwrap();
        assert_eq!(data, b"Honda");
        assert_eq!(cursor.position(), 7);
    }

    #[test]
    fn test_u8_round_trip() {
        let mut buf = vec![0u8; 16];
        let mut cursor = Cursor::new(0);
        put_u8_prefixed(&mut buf, &mut cursor, b"abc").unwrap();
        assert_eq!(cursor.position(), 4);
        assert_eq!(buf[0], 3);

        let mut cursor = Cursor::new(0);
        assert_eq!(get_u8_prefixed(&buf, &mut cursor).unwrap(), b"abc");
    }

    #[test]
    fn test_u32_round_trip() {
        let mut buf = vec![0u8; 64];
        let mut cursor = Cursor::new(0);
        let payload = vec![0xABu8; 40];
        put_u32_prefixed(&mut buf, &mut cursor, &payload).unwrap();
        assert_eq!(cursor.position(), 44);

        let mut cursor = Cursor::new(0);
        assert_eq!(get_u32_prefixed(&buf, &mut cursor).unwrap(), &payload[..]);
    }

    #[test]
    fn test_empty_payload() {
        let mut buf = vec![0u8; 8];
        let mut cursor = Cursor::new(0);
        put_u16_prefixed(&mut buf, &mut cursor, b"").unwrap();
        assert_eq!(cursor.position(), 2);

        let mut cursor = Cursor::new(0);
        assert_eq!(length_u16_prefixed(&buf, &cursor).unwrap(), 0);
        assert_eq!(get_u16_prefixed(&buf, &mut cursor).unwrap(), b"");
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_copy_clamps_but_advances_fully() {
        let mut buf = vec![0u8; 32];
        let mut cursor = Cursor::new(0);
        put_u16_prefixed(&mut buf, &mut cursor, b"Civic VTi").unwrap();

        let mut cursor = Cursor::new(0);
        let mut dst = [0u8; 5];
        let copied = copy_u16_prefixed(&buf, &mut cursor, &mut dst).unwrap();
        assert_eq!(copied, 5);
        assert_eq!(&dst, b"Civic");
        // Cursor is past the whole field, not just the copied part.
        assert_eq!(cursor.position(), 2 + 9);
    }

    #[test]
    fn test_u8_prefix_overflow() {
        let mut buf = vec![0u8; 512];
        let mut cursor = Cursor::new(0);
        let payload = vec![0u8; 256];
        assert!(matches!(
            put_u8_prefixed(&mut buf, &mut cursor, &payload),
            Err(Error::ValueOutOfRange { value: 256, .. })
        ));
    }

    #[test]
    fn test_put_bounds() {
        let mut buf = vec![0u8; 6];
        let mut cursor = Cursor::new(0);
        assert!(matches!(
            put_u16_prefixed(&mut buf, &mut cursor, b"Honda"),
            Err(Error::BufferTooShort { required: 7, available: 6 })
        ));
    }

    #[test]
    fn test_get_truncated_payload() {
        // Prefix says 10 bytes but only 4 remain.
        let mut buf = vec![0u8; 6];
        buf.put_u16_le(0, 10);
        let mut cursor = Cursor::new(0);
        assert!(matches!(
            get_u16_prefixed(&buf, &mut cursor),
            Err(Error::BufferTooShort { .. })
        ));
    }

    #[test]
    fn test_sequential_fields_stay_ordered() {
        let mut buf = vec![0u8; 64];
        let mut cursor = Cursor::new(0);
        put_u16_prefixed(&mut buf, &mut cursor, b"Honda").unwrap();
        put_u16_prefixed(&mut buf, &mut cursor, b"Civic VTi").unwrap();
        put_u16_prefixed(&mut buf, &mut cursor, b"deadbeef").unwrap();

        let mut cursor = Cursor::new(0);
        assert_eq!(get_u16_prefixed(&buf, &mut cursor).unwrap(), b"Honda");
        assert_eq!(get_u16_prefixed(&buf, &mut cursor).unwrap(), b"Civic VTi");
        assert_eq!(get_u16_prefixed(&buf, &mut cursor).unwrap(), b"deadbeef");
        assert_eq!(cursor.position(), (2 + 5) + (2 + 9) + (2 + 8));
    }
}
