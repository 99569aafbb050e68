//! Touch input
//!
//! Raw sensor readings are turned into screen points by a
//! [`CalibrationTransform`]; the [`TouchSampler`] applies it once per poll.

pub mod sampler;
pub mod transform;

pub use sampler::{TouchReading, TouchSampler, TouchState};
pub use transform::{AxisMap, CalibrationTransform, FitError, Q16_ONE};
