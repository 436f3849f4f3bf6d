//! tally-core - Core library for tally
//!
//! Turns raw behavior observations into interval-bucketed series and
//! previous/current period summaries, one aggregation strategy per data type.
//!
//! Every operation is a pure function of its inputs: `now` and the time zone
//! are explicit parameters, never read from the environment.

pub mod aggregate;
pub mod assemble;
pub mod bucket;
pub mod codec;
pub mod collection;
pub mod config;
pub mod edit;
pub mod error;
pub mod report;
pub mod steps;

pub use aggregate::{BucketValue, Summary};
pub use assemble::{Chart, DataTable, RawRow, Report, SeriesPoint};
pub use bucket::{BucketKey, Bucketing, Granularity, ParseGranularityError};
pub use codec::{DisplayValue, FrequencyMode, ParseDurationError, RawValue};
pub use collection::{summarize, CollectionEntry, Summaries};
pub use config::{ReportOptions, TallyConfig};
pub use error::{CoreError, ErrorSeverity, Result};
pub use report::{current, graph, previous, report, table};

pub use tally_types::{
    DataType, Observation, ObservationId, ObservationValue, Outcome, RateValue, Target, TargetId,
};
