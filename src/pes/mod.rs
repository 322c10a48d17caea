//! Packetized elementary stream.
//!
//! # References
//!
//! - [Packetized elementary stream](https://en.wikipedia.org/wiki/Packetized_elementary_stream)
pub use self::decoder::PesDecoder;
pub use self::header::{OptionalHeader, PesHeader};
pub use self::options::UnitOptions;
pub use self::unit::{ElementaryStreamUnit, Stage};

mod decoder;
mod header;
mod options;
mod unit;
