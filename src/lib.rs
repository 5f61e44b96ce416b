#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![deny(
    clippy::all,
    clippy::style,
    clippy::perf,
    clippy::complexity,
    clippy::correctness,
    clippy::unwrap_used,
    rust_2018_idioms
)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::use_self,
    clippy::upper_case_acronyms
)]

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

#[macro_use]
pub mod errors;
pub mod composed;
pub mod config;
pub mod crypto;
pub mod packet;
pub mod types;
pub mod util;

// reexports for easier use
pub use self::composed::{
    generate, read, read_armored, reformat, Key, KeyOptions, KeyOptionsBuilder, PrimaryUser,
    ReadResult, SubKey, User, UserBody,
};
pub use self::config::Config;
pub use self::packet::{KeyPacket, Packet, PacketList, SignaturePacket};
pub use self::types::KeyStatus;

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
