//! Flash storage driver for RP2040
//!
//! Uses sequential-storage for wear-leveled key-value storage in the last
//! 64KB of flash. The region is split into two partitions so the touch
//! calibration and the demo file never share erase pages.
//!
//! Each partition implements the blocking `FlashStorage` trait from
//! `panelbridge-hal` by driving the async flash with `block_on`.

use core::ops::Range;

use embassy_futures::block_on;
use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use embedded_storage_async::nor_flash::NorFlash;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

pub use panelbridge_hal::flash::{FlashError, StorageKey};

/// Flash storage configuration
pub const FLASH_SIZE: usize = 2 * 1024 * 1024; // 2MB flash on the Pico
pub const STORAGE_REGION_SIZE: usize = 64 * 1024;
pub const STORAGE_REGION_START: usize = FLASH_SIZE - STORAGE_REGION_SIZE;

/// Flash erase size for RP2040
pub const FLASH_ERASE_SIZE: usize = ERASE_SIZE;

const PARTITION_SIZE: usize = STORAGE_REGION_SIZE / 2;

/// Partition holding the touch calibration record
pub const CALIBRATION_RANGE: Range<u32> =
    (STORAGE_REGION_START as u32)..((STORAGE_REGION_START + PARTITION_SIZE) as u32);

/// Partition standing in for the removable storage card
pub const DEMO_RANGE: Range<u32> =
    ((STORAGE_REGION_START + PARTITION_SIZE) as u32)..(FLASH_SIZE as u32);

/// Largest stored value
const MAX_VALUE_SIZE: usize = 512;

type RpFlash<'d> = Flash<'d, FLASH, Async, FLASH_SIZE>;

/// RP2040 flash peripheral
///
/// Owns the flash and hands out partitions over fixed ranges.
pub struct Rp2040Flash<'d> {
    flash: RpFlash<'d>,
}

impl<'d> Rp2040Flash<'d> {
    /// Create a new flash instance
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
        }
    }

    /// Borrow one partition as key-value storage
    ///
    /// The range must be erase-page aligned and inside the storage region.
    pub fn partition(&mut self, range: Range<u32>) -> FlashPartition<'_, 'd> {
        debug_assert!(range.start as usize % FLASH_ERASE_SIZE == 0);
        debug_assert!(range.end as usize % FLASH_ERASE_SIZE == 0);
        debug_assert!(range.start as usize >= STORAGE_REGION_START);
        FlashPartition {
            flash: &mut self.flash,
            range,
        }
    }
}

/// Key-value storage over one flash range
///
/// A removed key is stored as an empty value; reads treat it as missing.
pub struct FlashPartition<'a, 'd> {
    flash: &'a mut RpFlash<'d>,
    range: Range<u32>,
}

impl FlashPartition<'_, '_> {
    /// Copy the live value for `key` into `out`, returning its length
    ///
    /// Tombstones read as `None`. With `out` empty only the length is
    /// reported.
    fn fetch(&mut self, key: StorageKey, out: &mut [u8]) -> Result<Option<usize>, FlashError> {
        let mut scratch = [0u8; MAX_VALUE_SIZE + 16];

        let result = block_on(map::fetch_item::<StorageKey, &[u8], _>(
            &mut *self.flash,
            self.range.clone(),
            &mut NoCache::new(),
            &mut scratch,
            &key,
        ));

        match result {
            Ok(Some(data)) if data.is_empty() => Ok(None),
            Ok(Some(data)) => {
                let len = data.len();
                if !out.is_empty() {
                    if out.len() < len {
                        return Err(FlashError::BufferTooSmall);
                    }
                    out[..len].copy_from_slice(data);
                }
                Ok(Some(len))
            }
            Ok(None) => Ok(None),
            Err(_) => Err(FlashError::Storage),
        }
    }

    fn store(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        let mut scratch = [0u8; MAX_VALUE_SIZE + 16];

        block_on(map::store_item(
            &mut *self.flash,
            self.range.clone(),
            &mut NoCache::new(),
            &mut scratch,
            &key,
            &data,
        ))
        .map_err(|e| match e {
            sequential_storage::Error::FullStorage => FlashError::Full,
            sequential_storage::Error::Storage { .. } => FlashError::Flash,
            sequential_storage::Error::Corrupted { .. } => FlashError::Corrupted,
            _ => FlashError::Storage,
        })
    }
}

impl panelbridge_hal::FlashStorage for FlashPartition<'_, '_> {
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        if buffer.is_empty() {
            return Err(FlashError::BufferTooSmall);
        }
        self.fetch(key, buffer)?.ok_or(FlashError::NotFound)
    }

    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        if data.len() > MAX_VALUE_SIZE {
            return Err(FlashError::BufferTooSmall);
        }
        if data.is_empty() {
            // Empty values are reserved for removal
            return Err(FlashError::Corrupted);
        }
        self.store(key, data)
    }

    fn remove(&mut self, key: StorageKey) -> Result<(), FlashError> {
        if !self.exists(key) {
            return Ok(());
        }
        self.store(key, &[])
    }

    fn exists(&mut self, key: StorageKey) -> bool {
        matches!(self.fetch(key, &mut []), Ok(Some(_)))
    }

    fn erase_all(&mut self) -> Result<(), FlashError> {
        block_on(self.flash.erase(self.range.start, self.range.end)).map_err(|_| FlashError::Flash)
    }
}
