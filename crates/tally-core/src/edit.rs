//! Corrections to stored observations
//!
//! A correction replaces an observation's value in place. The id, target and
//! timestamp never change, and neither does the value's data type.

use tally_types::{Observation, ObservationValue, Target};

use crate::codec::{decode_for, FrequencyMode, RawValue};
use crate::error::{CoreError, Result};

/// Replace the stored value of `observation` with `value`.
///
/// Fails with `ValueShapeMismatch` if `value` is of a different data type; the
/// observation is left untouched in that case.
pub fn apply_correction(observation: &mut Observation, value: ObservationValue) -> Result<()> {
    let expected = observation.data_type();
    let found = value.data_type();
    if found != expected {
        return Err(CoreError::ValueShapeMismatch {
            observation_id: observation.id.clone(),
            expected,
            found,
        });
    }

    tracing::debug!(
        observation = %observation.id,
        data_type = %expected,
        "correcting observation"
    );
    observation.value = value;
    Ok(())
}

/// Decode form input against `target` and apply it as a correction.
///
/// `mode` is passed through to the decoder; with [`FrequencyMode::Delta`] the
/// stored count becomes the entered total minus `original`.
pub fn correct_from_input(
    target: &Target,
    observation: &mut Observation,
    raw: &RawValue,
    mode: FrequencyMode,
) -> Result<()> {
    let value = decode_for(target, raw, mode)?;
    apply_correction(observation, value)
}
