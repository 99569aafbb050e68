//! Touch calibration
//!
//! Persistence of the [`CalibrationTransform`](crate::touch::CalibrationTransform),
//! the interactive four-corner procedure, and the boot-time policy that
//! picks between them.

pub mod procedure;
pub mod store;

pub use procedure::{
    reference_targets, CalibrationProcedure, CalibrationPrompt, CALIBRATION_MARGIN_PX,
    MAX_CALIBRATION_ERROR_PX, SAMPLES_PER_TARGET,
};
pub use store::{CalibrationError, CalibrationRecord, CalibrationStore};

use panelbridge_hal::FlashStorage;

use crate::config::BridgeConfig;
use crate::touch::CalibrationTransform;
use crate::traits::TouchController;

/// Where the active calibration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationSource {
    /// Loaded from storage as-is
    Stored,
    /// Loaded from storage, recorded under another rotation
    StoredRerotated,
    /// Freshly measured; `persisted` carries the save result
    Interactive {
        persisted: Result<(), CalibrationError>,
    },
}

/// Result of [`ensure_calibration`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationOutcome {
    pub transform: CalibrationTransform,
    pub source: CalibrationSource,
    /// Why the stored calibration was not used (None if it was, or if
    /// calibration was forced)
    pub load_error: Option<CalibrationError>,
}

/// Boot-time calibration policy
///
/// Uses the stored calibration unless `force_calibration` is set or nothing
/// usable is stored; otherwise runs the interactive procedure once and
/// saves the result. A failed save is reported in the outcome, the fresh
/// transform is still returned.
pub fn ensure_calibration<S, T, P>(
    store: &mut CalibrationStore<S>,
    touch: &mut T,
    prompt: &mut P,
    config: &BridgeConfig,
) -> CalibrationOutcome
where
    S: FlashStorage,
    T: TouchController,
    P: CalibrationPrompt,
{
    let mut load_error = None;

    if !config.force_calibration {
        match store.try_load() {
            Ok(stored) if stored.rotation == config.rotation => {
                return CalibrationOutcome {
                    transform: stored,
                    source: CalibrationSource::Stored,
                    load_error: None,
                };
            }
            Ok(stored) => {
                return CalibrationOutcome {
                    transform: stored.rerotate(config.rotation, config.native),
                    source: CalibrationSource::StoredRerotated,
                    load_error: None,
                };
            }
            Err(e) => load_error = Some(e),
        }
    }

    let procedure = CalibrationProcedure::new(config.logical_size(), config.rotation);
    let transform = procedure.run(touch, prompt);
    let persisted = store.save(&transform);

    CalibrationOutcome {
        transform,
        source: CalibrationSource::Interactive { persisted },
        load_error,
    }
}
