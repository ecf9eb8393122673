//! Wire envelope codec for the framebridge protocol.
//!
//! Every message posted across the frame boundary is one of:
//! - a bare control token string (`"handshake"`, `"fullscr"`, ...)
//! - an operation call `{ methodName, paramsJson }`
//! - a correlated result `{ methodName: "return", returnKey, returnValue }`
//!
//! Decoding never fails loudly: anything that is not one of the above is
//! dropped by the receiver.

pub mod codec;
pub mod error;
pub mod token;

pub use codec::{
    decode, encode_call, encode_params, encode_return, is_private, try_decode, Arguments,
    Envelope, PRIVATE_MARKER, RETURN_OPERATION,
};
pub use error::{EnvelopeError, Result};
pub use token::ControlToken;
