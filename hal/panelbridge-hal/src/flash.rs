//! Persistent blob storage
//!
//! Two unrelated users share this interface: the touch calibration record
//! and the boot-time storage demo. Each gets its own key and, on hardware,
//! its own flash partition.

/// Identifies one stored blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StorageKey {
    /// Calibration record (postcard)
    TouchCalibration = 0,
    /// Demo text file
    DemoText = 1,
    Reserved2 = 2,
    Reserved3 = 3,
}

impl StorageKey {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(StorageKey::TouchCalibration),
            1 => Some(StorageKey::DemoText),
            2 => Some(StorageKey::Reserved2),
            3 => Some(StorageKey::Reserved3),
            _ => None,
        }
    }
}

/// Storage failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// The flash peripheral reported an error
    Flash,
    /// The key-value layer failed
    Storage,
    /// Nothing stored under the key
    NotFound,
    /// Caller's buffer cannot hold the stored value, or the value is too big
    /// to store
    BufferTooSmall,
    /// Stored data failed its integrity check
    Corrupted,
    /// No room left in the partition
    Full,
}

/// Blocking key/blob store
///
/// Calls block until the flash operation has finished. The bridge only
/// touches storage during setup, from its single execution context.
pub trait FlashStorage {
    /// Copy the value stored under `key` into `buffer`, returning its length
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError>;

    /// Store `data` under `key`, replacing any previous value
    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError>;

    /// Drop the value under `key`; a missing key is not an error
    fn remove(&mut self, key: StorageKey) -> Result<(), FlashError>;

    fn exists(&mut self, key: StorageKey) -> bool;

    /// Wipe every key in this store
    fn erase_all(&mut self) -> Result<(), FlashError>;
}

impl<T: FlashStorage + ?Sized> FlashStorage for &mut T {
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        (**self).read(key, buffer)
    }

    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        (**self).write(key, data)
    }

    fn remove(&mut self, key: StorageKey) -> Result<(), FlashError> {
        (**self).remove(key)
    }

    fn exists(&mut self, key: StorageKey) -> bool {
        (**self).exists(key)
    }

    fn erase_all(&mut self) -> Result<(), FlashError> {
        (**self).erase_all()
    }
}

// Implement the sequential-storage Key trait when the feature is enabled
#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for StorageKey {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        buffer[0] = self.as_u8();
        Ok(1)
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        match StorageKey::from_u8(buffer[0]) {
            Some(key) => Ok((key, 1)),
            None => Err(sequential_storage::map::SerializationError::InvalidFormat),
        }
    }
}
