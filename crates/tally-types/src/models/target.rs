//! Tracked targets

use serde::{Deserialize, Serialize};

use super::data_type::{DataType, UnknownDataType};
use super::ids::{ProgramId, TargetId};

/// A tracked behavior or skill inside a program.
///
/// `data_type` is kept as the raw tag the persistence layer stored, so a tag
/// without an aggregator reaches the reporting code and is rejected there
/// instead of failing deserialization of the whole target list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub name: String,
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_id: Option<ProgramId>,
    /// Ordered step labels (Task Analysis only). A step's position is its identity.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<String>,
}

impl Target {
    pub fn new(id: impl Into<TargetId>, name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            data_type: data_type.tag().to_string(),
            program_id: None,
            steps: Vec::new(),
        }
    }

    pub fn with_program(mut self, program_id: impl Into<ProgramId>) -> Self {
        self.program_id = Some(program_id.into());
        self
    }

    pub fn with_steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps = steps.into_iter().map(Into::into).collect();
        self
    }

    /// Parse the stored tag
    pub fn kind(&self) -> Result<DataType, UnknownDataType> {
        self.data_type.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_builder() {
        let target = Target::new("t-1", "Tie shoes", DataType::TaskAnalysis)
            .with_program("p-1")
            .with_steps(["cross laces", "loop", "pull"]);

        assert_eq!(target.data_type, "Task Analysis");
        assert_eq!(target.kind(), Ok(DataType::TaskAnalysis));
        assert_eq!(target.steps.len(), 3);
        assert_eq!(target.program_id.as_deref(), Some("p-1"));
    }

    #[test]
    fn test_unknown_tag_survives_deserialization() {
        let json = r#"{"id": "t-2", "name": "On task", "data_type": "Whole Interval"}"#;
        let target: Target = serde_json::from_str(json).unwrap();
        assert!(target.steps.is_empty());
        assert_eq!(target.kind().unwrap_err().tag, "Whole Interval");
    }
}
