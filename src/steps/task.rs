use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Progress of one workflow task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, JsonSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum StepStatus {
    #[default]
    Incomplete,
    InProgress,
    Complete,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Incomplete => write!(f, "incomplete"),
            StepStatus::InProgress => write!(f, "inprogress"),
            StepStatus::Complete => write!(f, "complete"),
        }
    }
}

/// One unit of a sequential workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, JsonSchema)]
#[ts(export)]
pub struct StepTask {
    pub name: String,
    #[serde(default)]
    pub status: StepStatus,
    /// Position in the workflow, unique within a sequence
    pub index: u32,
}

impl StepTask {
    pub fn new(name: impl Into<String>, index: u32) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Incomplete,
            index,
        }
    }

    pub fn with_status(mut self, status: StepStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == StepStatus::InProgress
    }
}

/// Build a sequence from task names, indexed in order. The first task is
/// marked in progress when `start` is set.
pub fn sequence_from_names<S: AsRef<str>>(names: &[S], start: bool) -> Vec<StepTask> {
    names
        .iter()
        .zip(0u32..)
        .map(|(name, index)| {
            let task = StepTask::new(name.as_ref(), index);
            if start && index == 0 {
                task.with_status(StepStatus::InProgress)
            } else {
                task
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&StepStatus::InProgress).unwrap();
        assert_eq!(json, "\"inprogress\"");
        let parsed: StepStatus = serde_json::from_str("\"complete\"").unwrap();
        assert_eq!(parsed, StepStatus::Complete);
    }

    #[test]
    fn test_task_status_defaults_to_incomplete() {
        let task: StepTask = serde_json::from_str(r#"{"name":"plan","index":0}"#).unwrap();
        assert_eq!(task.status, StepStatus::Incomplete);
        assert!(!task.is_in_progress());
    }

    #[test]
    fn test_sequence_from_names() {
        let steps = sequence_from_names(&["plan", "build", "test"], true);
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].status, StepStatus::InProgress);
        assert_eq!(steps[2].index, 2);
        assert_eq!(steps[2].status, StepStatus::Incomplete);

        let idle = sequence_from_names(&["plan"], false);
        assert_eq!(idle[0].status, StepStatus::Incomplete);
    }
}
