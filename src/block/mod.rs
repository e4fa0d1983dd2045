//! Bit-exact layouts of the compressed blocks.
//!
//! The types in here only move bits around. They do not know how to turn
//! blocks into pixels or pixels into blocks.

mod bits;

pub(crate) mod bc1;
pub(crate) mod bc6;
pub(crate) mod bc7;

pub(crate) use bc1::*;
pub(crate) use bc6::*;
pub(crate) use bc7::*;
