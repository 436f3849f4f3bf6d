//! Task analysis step list editing
//!
//! A step is identified by its position. Editing the list only affects how new
//! entries are decoded; stored records keep their own length and are scored
//! against it.

use tally_types::Target;

use crate::error::{CoreError, Result};

fn check_index(target: &Target, index: usize) -> Result<()> {
    if index < target.steps.len() {
        Ok(())
    } else {
        Err(CoreError::StepIndexOutOfRange {
            index,
            len: target.steps.len(),
        })
    }
}

/// Append a step at the end of the list
pub fn add_step(target: &mut Target, label: impl Into<String>) {
    target.steps.push(label.into());
}

pub fn rename_step(target: &mut Target, index: usize, label: impl Into<String>) -> Result<()> {
    check_index(target, index)?;
    target.steps[index] = label.into();
    Ok(())
}

/// Remove the step at `index`, returning its label
pub fn remove_step(target: &mut Target, index: usize) -> Result<String> {
    check_index(target, index)?;
    Ok(target.steps.remove(index))
}

/// Move the step at `from` so that it ends up at position `to`.
///
/// Both indexes refer to the list as it is before the move.
pub fn move_step(target: &mut Target, from: usize, to: usize) -> Result<()> {
    check_index(target, from)?;
    check_index(target, to)?;
    if from == to {
        return Ok(());
    }

    let step = target.steps.remove(from);
    target.steps.insert(to, step);
    tracing::debug!(target_id = %target.id, from, to, "moved task analysis step");
    Ok(())
}
