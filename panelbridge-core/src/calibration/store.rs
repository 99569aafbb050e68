//! Calibration persistence
//!
//! Loads and saves the touch calibration transform to flash storage as a
//! postcard blob with a magic number, version and CRC.

use serde::{Deserialize, Serialize};

use panelbridge_hal::{FlashError, FlashStorage, StorageKey};

use crate::touch::CalibrationTransform;

/// Magic number to identify valid calibration data
pub const CALIBRATION_MAGIC: u32 = 0x5443_414C; // "TCAL"

/// Current calibration data version
pub const CALIBRATION_VERSION: u8 = 1;

/// Maximum serialized calibration size
pub const MAX_CALIBRATION_SIZE: usize = 64;

/// Calibration persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Flash operation failed (`NotFound` when nothing is stored)
    Flash(FlashError),
    /// Deserialization failed
    Deserialize,
    /// Serialization failed
    Serialize,
    /// CRC check failed
    CrcMismatch,
    /// Invalid magic or version
    InvalidFormat,
}

impl From<FlashError> for CalibrationError {
    fn from(e: FlashError) -> Self {
        CalibrationError::Flash(e)
    }
}

/// Calibration blob stored in flash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationRecord {
    /// Magic number for validation
    pub magic: u32,
    /// Data format version
    pub version: u8,
    pub transform: CalibrationTransform,
    /// CRC32 checksum over the transform
    pub crc: u32,
}

impl CalibrationRecord {
    /// Wrap a transform with a fresh header and CRC
    pub fn new(transform: CalibrationTransform) -> Self {
        Self {
            magic: CALIBRATION_MAGIC,
            version: CALIBRATION_VERSION,
            transform,
            crc: calculate_crc(&transform),
        }
    }

    /// Check if the header is valid (magic and version match)
    pub fn is_valid(&self) -> bool {
        self.magic == CALIBRATION_MAGIC && self.version == CALIBRATION_VERSION
    }

    /// Verify the CRC is correct
    pub fn verify_crc(&self) -> bool {
        self.crc == calculate_crc(&self.transform)
    }
}

/// Calibration store backed by a key/blob storage
///
/// Only ever touches [`StorageKey::TouchCalibration`].
pub struct CalibrationStore<S> {
    storage: S,
}

impl<S: FlashStorage> CalibrationStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Load the stored transform
    ///
    /// Returns `None` if nothing is stored or the data is unusable.
    pub fn load(&mut self) -> Option<CalibrationTransform> {
        self.try_load().ok()
    }

    /// Load the stored transform, reporting why it is unusable
    pub fn try_load(&mut self) -> Result<CalibrationTransform, CalibrationError> {
        let mut buffer = [0u8; MAX_CALIBRATION_SIZE];
        let len = self
            .storage
            .read(StorageKey::TouchCalibration, &mut buffer)?;

        let record: CalibrationRecord =
            postcard::from_bytes(&buffer[..len]).map_err(|_| CalibrationError::Deserialize)?;

        if !record.is_valid() {
            return Err(CalibrationError::InvalidFormat);
        }
        if !record.verify_crc() {
            return Err(CalibrationError::CrcMismatch);
        }

        Ok(record.transform)
    }

    /// Persist a transform
    ///
    /// On error the transform is still valid for this session but will not
    /// survive a restart; the caller decides how to tell the user.
    pub fn save(&mut self, transform: &CalibrationTransform) -> Result<(), CalibrationError> {
        let record = CalibrationRecord::new(*transform);

        let mut buffer = [0u8; MAX_CALIBRATION_SIZE];
        let bytes =
            postcard::to_slice(&record, &mut buffer).map_err(|_| CalibrationError::Serialize)?;

        self.storage
            .write(StorageKey::TouchCalibration, bytes)
            .map_err(CalibrationError::Flash)
    }

    /// Forget the stored calibration
    pub fn clear(&mut self) -> Result<(), CalibrationError> {
        self.storage
            .remove(StorageKey::TouchCalibration)
            .map_err(CalibrationError::Flash)
    }

    /// Return the underlying storage
    pub fn into_inner(self) -> S {
        self.storage
    }
}

/// CRC32 over the transform fields in a fixed little-endian layout
fn calculate_crc(transform: &CalibrationTransform) -> u32 {
    let mut crc: u32 = 0xFFFFFFFF;

    crc = crc32_update(crc, &[transform.rotation.quarter_turns()]);
    crc = crc32_update(crc, &[transform.swap_axes as u8]);
    crc = crc32_update(crc, &transform.x.scale_q16.to_le_bytes());
    crc = crc32_update(crc, &transform.x.offset_q16.to_le_bytes());
    crc = crc32_update(crc, &transform.y.scale_q16.to_le_bytes());
    crc = crc32_update(crc, &transform.y.offset_q16.to_le_bytes());

    !crc
}

/// Simple CRC32 update function (IEEE 802.3 polynomial)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB88320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geometry::Rotation;
    use crate::touch::AxisMap;
    use heapless::{FnvIndexMap, Vec};
    use proptest::prelude::*;

    /// In-memory key/blob storage
    pub(crate) struct MemoryFlash {
        entries: FnvIndexMap<u8, Vec<u8, 128>, 4>,
        pub(crate) fail_writes: bool,
        pub(crate) writes: u32,
    }

    impl MemoryFlash {
        pub(crate) fn new() -> Self {
            Self {
                entries: FnvIndexMap::new(),
                fail_writes: false,
                writes: 0,
            }
        }

        pub(crate) fn raw_mut(&mut self, key: StorageKey) -> Option<&mut Vec<u8, 128>> {
            self.entries.get_mut(&key.as_u8())
        }
    }

    impl FlashStorage for MemoryFlash {
        fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
            let data = self.entries.get(&key.as_u8()).ok_or(FlashError::NotFound)?;
            if buffer.len() < data.len() {
                return Err(FlashError::BufferTooSmall);
            }
            buffer[..data.len()].copy_from_slice(data);
            Ok(data.len())
        }

        fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
            self.writes += 1;
            if self.fail_writes {
                return Err(FlashError::Flash);
            }
            let blob = Vec::from_slice(data).map_err(|_| FlashError::Full)?;
            self.entries
                .insert(key.as_u8(), blob)
                .map_err(|_| FlashError::Full)?;
            Ok(())
        }

        fn remove(&mut self, key: StorageKey) -> Result<(), FlashError> {
            self.entries.remove(&key.as_u8());
            Ok(())
        }

        fn exists(&mut self, key: StorageKey) -> bool {
            self.entries.contains_key(&key.as_u8())
        }

        fn erase_all(&mut self) -> Result<(), FlashError> {
            self.entries.clear();
            Ok(())
        }
    }

    fn sample_transform() -> CalibrationTransform {
        CalibrationTransform {
            rotation: Rotation::Deg90,
            swap_axes: true,
            x: AxisMap {
                scale_q16: -5957,
                offset_q16: 22_638_036,
            },
            y: AxisMap {
                scale_q16: 4681,
                offset_q16: -1_404_061,
            },
        }
    }

    #[test]
    fn test_load_empty_store() {
        let mut store = CalibrationStore::new(MemoryFlash::new());
        assert_eq!(store.load(), None);
        assert_eq!(
            store.try_load(),
            Err(CalibrationError::Flash(FlashError::NotFound))
        );
    }

    #[test]
    fn test_save_then_load() {
        let mut store = CalibrationStore::new(MemoryFlash::new());
        let transform = sample_transform();
        store.save(&transform).unwrap();
        assert_eq!(store.load(), Some(transform));
    }

    #[test]
    fn test_save_failure_is_surfaced() {
        let mut flash = MemoryFlash::new();
        flash.fail_writes = true;
        let mut store = CalibrationStore::new(flash);

        assert_eq!(
            store.save(&sample_transform()),
            Err(CalibrationError::Flash(FlashError::Flash))
        );
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_corrupted_blob_is_rejected() {
        let mut store = CalibrationStore::new(MemoryFlash::new());
        store.save(&sample_transform()).unwrap();

        let mut flash = store.into_inner();
        let blob = flash.raw_mut(StorageKey::TouchCalibration).unwrap();
        // Flip a low bit near the end of the record
        let idx = blob.len() - 6;
        blob[idx] ^= 0x01;

        let mut store = CalibrationStore::new(flash);
        assert!(store.try_load().is_err());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_truncated_blob_is_rejected() {
        let mut store = CalibrationStore::new(MemoryFlash::new());
        store.save(&sample_transform()).unwrap();

        let mut flash = store.into_inner();
        flash.raw_mut(StorageKey::TouchCalibration).unwrap().truncate(3);

        let mut store = CalibrationStore::new(flash);
        assert_eq!(store.try_load(), Err(CalibrationError::Deserialize));
    }

    #[test]
    fn test_wrong_version_is_rejected() {
        let mut record = CalibrationRecord::new(sample_transform());
        record.version = CALIBRATION_VERSION + 1;
        let mut buf = [0u8; MAX_CALIBRATION_SIZE];
        let bytes = postcard::to_slice(&record, &mut buf).unwrap();

        let mut flash = MemoryFlash::new();
        flash.write(StorageKey::TouchCalibration, bytes).unwrap();
        let mut store = CalibrationStore::new(flash);
        assert_eq!(store.try_load(), Err(CalibrationError::InvalidFormat));
    }

    #[test]
    fn test_clear() {
        let mut store = CalibrationStore::new(MemoryFlash::new());
        store.save(&sample_transform()).unwrap();
        store.clear().unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_only_calibration_key_is_touched() {
        let mut flash = MemoryFlash::new();
        flash.write(StorageKey::DemoText, b"hello").unwrap();

        let mut store = CalibrationStore::new(&mut flash);
        store.save(&sample_transform()).unwrap();
        store.clear().unwrap();

        let mut buf = [0u8; 16];
        let len = flash.read(StorageKey::DemoText, &mut buf).unwrap();
        assert_eq!(&buf[..len], b"hello");
    }

    proptest! {
        #[test]
        fn prop_store_roundtrip(
            turns in 0u8..4,
            swap_axes: bool,
            xs: i32, xo: i32, ys: i32, yo: i32,
        ) {
            let transform = CalibrationTransform {
                rotation: Rotation::from_quarter_turns(turns).unwrap(),
                swap_axes,
                x: AxisMap { scale_q16: xs, offset_q16: xo },
                y: AxisMap { scale_q16: ys, offset_q16: yo },
            };
            let mut store = CalibrationStore::new(MemoryFlash::new());
            store.save(&transform).unwrap();
            prop_assert_eq!(store.load(), Some(transform));
        }
    }
}
