//! # wiresbe IR
//!
//! Serialized intermediate representation of SBE message schemas.
//!
//! This crate provides:
//! - The token model: one tagged node per schema element
//! - The [`Ir`] collection: envelope layout plus per-template token
//!   lists, immutable once loaded and shared across decoders
//! - Well-formedness validation of token lists
//! - [`TokenListBuilder`] for in-memory IR construction
//! - The IR codec: Frame and Token SBE messages for `.sbeir` transport

pub mod builder;
pub mod codec;
pub mod error;
pub mod ir;
pub mod token;

pub use builder::TokenListBuilder;
pub use codec::{IrDecoder, IrEncoder};
pub use error::{IrError, Result};
pub use ir::Ir;
pub use token::{Encoding, PrimitiveValue, Signal, Token};
