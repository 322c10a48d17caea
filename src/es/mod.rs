//! Elementary stream.
pub use self::stream_id::StreamId;

mod stream_id;
