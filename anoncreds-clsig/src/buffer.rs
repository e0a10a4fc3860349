use alloc::vec::Vec;

use crate::error::Error;

/// A target for serialized bytes, such as a hash state or a growable buffer
pub trait WriteBuffer {
    /// Append a slice of bytes to the target
    fn buffer_write(&mut self, data: &[u8]) -> Result<(), Error>;
}

impl WriteBuffer for Vec<u8> {
    fn buffer_write(&mut self, data: &[u8]) -> Result<(), Error> {
        self.extend_from_slice(data);
        Ok(())
    }
}
