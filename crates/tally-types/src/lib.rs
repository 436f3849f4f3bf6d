//! tally-types - Shared data types for tally
//!
//! This crate contains pure data structures without heavy dependencies.
//! No config loading, no thread pools - just serde-serializable types.
//!
//! Used by:
//! - tally-core (aggregation engine)
//! - tally (developer CLI)
//! - the web layer that owns persistence and rendering

pub mod models;

pub use models::{
    DataType, Observation, ObservationId, ObservationValue, Outcome, ParseOutcomeError, ProgramId,
    RateValue, Target, TargetId, UnknownDataType,
};
