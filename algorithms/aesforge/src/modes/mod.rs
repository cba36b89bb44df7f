//! Cipher Modes
//!
//! Per-session state machines over the block primitive.

pub mod cbc;
pub mod gcm;

pub use cbc::CbcCipher;
pub use gcm::GcmCipher;
