//! Repeating-group flyweights.
//!
//! A group is a [`GroupDimensions`] header followed by `num_in_group`
//! entries. [`GroupEncoder`] and [`GroupDecoder`] borrow the parent
//! message's buffer and [`Cursor`]; `next()` hands back the entry's
//! fixed-block base offset and advances the cursor past the entry block,
//! so nested groups and var-data written through the same cursor land
//! exactly before the next entry.

use crate::bounds;
use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::header::GroupDimensions;

/// Flyweight for encoding a repeating group.
#[derive(Debug)]
pub struct GroupEncoder {
    block_length: u16,
    count: u16,
    index: u16,
}

impl GroupEncoder {
    /// Writes the dimensions header at the cursor and prepares entry
    /// iteration.
    ///
    /// The header is written before any entry, and the cursor advances
    /// past it immediately.
    ///
    /// # Arguments
    /// * `buffer` - Buffer to write to
    /// * `cursor` - The parent message's variable-region cursor
    /// * `block_length` - Fixed-block size of one entry in bytes
    /// * `count` - Number of entries that will be written
    ///
    /// # Errors
    /// `Error::GroupCountOverflow` when `count` exceeds the dimensions
    /// header's numInGroup maximum; `Error::BufferTooShort` when the
    /// header does not fit.
    pub fn wrap<B: WriteBuffer + ?Sized>(
        buffer: &mut B,
        cursor: &mut Cursor,
        block_length: u16,
        count: usize,
    ) -> Result<Self> {
        if count > u16::MAX as usize {
            return Err(Error::GroupCountOverflow {
                count,
                max: u16::MAX as usize,
            });
        }
        let dims = GroupDimensions::new(block_length, count as u16);
        dims.write(buffer, cursor.position())?;
        cursor.advance(GroupDimensions::ENCODED_LENGTH);
        Ok(Self {
            block_length,
            count: count as u16,
            index: 0,
        })
    }

    /// Begins the next entry, returning its fixed-block base offset.
    ///
    /// The cursor advances by the entry block length; entry fields are
    /// then written at `base + field_offset` and nested groups/var-data
    /// through the shared cursor.
    ///
    /// # Errors
    /// `Error::GroupIndexOutOfBounds` when all declared entries have been
    /// written; `Error::BufferTooShort` when the entry block does not
    /// fit.
    pub fn next<B: ReadBuffer + ?Sized>(
        &mut self,
        buffer: &B,
        cursor: &mut Cursor,
    ) -> Result<usize> {
        if self.index >= self.count {
            return Err(Error::GroupIndexOutOfBounds {
                index: self.index as usize,
                count: self.count as usize,
            });
        }
        bounds::check(buffer.len(), cursor.position(), self.block_length as usize)?;
        self.index += 1;
        Ok(cursor.advance(self.block_length as usize))
    }

    /// Returns the declared entry count.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count as usize
    }

    /// Returns the number of entries begun so far.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index as usize
    }

    /// Returns true if another entry remains to be written.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.index < self.count
    }
}

/// Flyweight for decoding a repeating group.
///
/// The entry block length comes from the wire, not the reader's schema,
/// which is what makes block-length evolution work: a newer reader skips
/// bytes it does not know, an older reader never reads past what the
/// writer produced.
#[derive(Debug)]
pub struct GroupDecoder {
    block_length: u16,
    count: u16,
    index: u16,
}

impl GroupDecoder {
    /// Reads the dimensions header at the cursor and prepares entry
    /// iteration.
    ///
    /// # Arguments
    /// * `buffer` - Buffer to read from
    /// * `cursor` - The parent message's variable-region cursor
    ///
    /// # Errors
    /// `Error::BufferTooShort` when the header does not fit.
    pub fn wrap<B: ReadBuffer + ?Sized>(buffer: &B, cursor: &mut Cursor) -> Result<Self> {
        let dims = GroupDimensions::read(buffer, cursor.position())?;
        cursor.advance(GroupDimensions::ENCODED_LENGTH);
        Ok(Self {
            block_length: dims.block_length,
            count: dims.num_in_group,
            index: 0,
        })
    }

    /// Advances to the next entry, returning its fixed-block base
    /// offset.
    ///
    /// # Errors
    /// `Error::GroupIndexOutOfBounds` past the last entry;
    /// `Error::BufferTooShort` when the entry block crosses the end of
    /// the buffer.
    pub fn next<B: ReadBuffer + ?Sized>(
        &mut self,
        buffer: &B,
        cursor: &mut Cursor,
    ) -> Result<usize> {
        if self.index >= self.count {
            return Err(Error::GroupIndexOutOfBounds {
                index: self.index as usize,
                count: self.count as usize,
            });
        }
        bounds::check(buffer.len(), cursor.position(), self.block_length as usize)?;
        self.index += 1;
        Ok(cursor.advance(self.block_length as usize))
    }

    /// Returns the entry count read from the wire.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count as usize
    }

    /// Returns the number of entries visited so far.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index as usize
    }

    /// Returns true if another entry remains.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.index < self.count
    }

    /// Returns the entry block length advertised by the writer.
    #[must_use]
    pub const fn acting_block_length(&self) -> u16 {
        self.block_length
    }
}
