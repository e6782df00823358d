//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits.
//!
//! ```ignore
//! use wiresbe::prelude::*;
//! ```

// Core types
pub use wiresbe_core::buffer::{AlignedBuffer, BufferPool, ReadBuffer, WriteBuffer};
pub use wiresbe_core::cursor::Cursor;
pub use wiresbe_core::decoder::SbeDecoder;
pub use wiresbe_core::encoder::SbeEncoder;
pub use wiresbe_core::error::{Error as CoreError, Result as CoreResult};
pub use wiresbe_core::group::{GroupDecoder, GroupEncoder};
pub use wiresbe_core::header::{GroupDimensions, MessageHeader};
pub use wiresbe_core::message::SbeMessage;
pub use wiresbe_core::types::{ByteOrder, Presence, PrimitiveType};
pub use wiresbe_core::var_data;

// IR types
pub use wiresbe_ir::builder::TokenListBuilder;
pub use wiresbe_ir::codec::{IrDecoder, IrEncoder};
pub use wiresbe_ir::error::IrError;
pub use wiresbe_ir::ir::Ir;
pub use wiresbe_ir::token::{Encoding, PrimitiveValue, Signal, Token};

// OTF types
pub use wiresbe_otf::decoder::{OtfDecoder, decode_message};
pub use wiresbe_otf::error::OtfError;
pub use wiresbe_otf::header_decoder::OtfHeaderDecoder;
pub use wiresbe_otf::listener::{
    TokenListener, active_choices, resolve_valid_value, unsigned_value,
};
