#[macro_use]
mod macros;

pub(crate) mod alert;
pub(crate) mod base;
pub(crate) mod ccs;
pub(crate) mod codec;
pub(crate) mod handshake;
pub(crate) mod hsjoiner;
pub(crate) mod message;
