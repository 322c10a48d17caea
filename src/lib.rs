//! Incremental PES (Packetized Elementary Stream) reassembler.
//!
//! Transport stream payload fragments are fed, in arrival order, to an
//! [`ElementaryStreamUnit`](pes/struct.ElementaryStreamUnit.html) which rebuilds one
//! PES packet: its fixed header, optional header, PTS/DTS and payload.
//! [`PesDecoder`](pes/struct.PesDecoder.html) keeps one such unit per PID.
//!
//! # Examples
//!
//! ```
//! # extern crate mpeg2ts_pes;
//! use mpeg2ts_pes::pes::ElementaryStreamUnit;
//! use mpeg2ts_pes::Pid;
//!
//! # fn main() -> Result<(), mpeg2ts_pes::Error> {
//! let pid = Pid::new(0x100)?;
//! let mut unit = ElementaryStreamUnit::new(pid);
//!
//! // Private stream: no optional header, 2 bytes of payload.
//! let bytes = [0x00, 0x00, 0x01, 0xBD, 0x00, 0x02, 0xAA, 0xBB];
//! let consumed = unit.append(&bytes[..4])? + unit.append(&bytes[4..])?;
//! assert_eq!(consumed, bytes.len());
//! assert!(unit.is_completed());
//! assert_eq!(unit.payload(), Some(&[0xAA, 0xBB][..]));
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs)]
extern crate byteorder;
#[macro_use]
extern crate trackable;
extern crate log;

pub use crate::error::{Error, ErrorKind};
pub use crate::pid::Pid;

pub mod bits;
pub mod es;
pub mod pes;
pub mod time;

mod error;
mod pid;

/// This crate specific `Result` type.
pub type Result<T> = std::result::Result<T, Error>;
