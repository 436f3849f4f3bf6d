//! Data models for tally

pub mod data_type;
pub mod ids;
pub mod observation;
pub mod target;

pub use data_type::{DataType, Outcome, ParseOutcomeError, UnknownDataType};
pub use ids::{ObservationId, ProgramId, TargetId};
pub use observation::{Observation, ObservationValue, RateValue};
pub use target::Target;
