use crate::{ErrorKind, Result};

/// Packet identifier of a logical stream within a transport multiplex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pid(u16);
impl Pid {
    /// Maximum value of a PID (13 bits).
    pub const MAX: u16 = 0x1FFF;

    /// Makes a new `Pid` instance.
    ///
    /// # Errors
    ///
    /// If `pid` exceeds `Pid::MAX`, it will return an `ErrorKind::InvalidInput` error.
    pub fn new(pid: u16) -> Result<Self> {
        track_assert!(pid <= Self::MAX, ErrorKind::InvalidInput, "Too large PID: {}", pid);
        Ok(Pid(pid))
    }

    /// Returns the value of the identifier.
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}
impl From<u8> for Pid {
    fn from(f: u8) -> Self {
        Pid(u16::from(f))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn new_pid() {
        assert_eq!(track_try_unwrap!(Pid::new(0x1FFF)).as_u16(), 0x1FFF);
        assert!(Pid::new(0x2000).is_err());
        assert_ne!(track_try_unwrap!(Pid::new(0x100)), Pid::from(0x00));
        assert_eq!(Pid::from(0x42).as_u16(), 0x42);
    }
}
