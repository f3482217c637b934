// ABOUTME: Data structures for replication tasks served by the NAS API
// ABOUTME: Mirrors the TrueNAS REST shapes, including Mongo-style timestamps

use std::fmt;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ReplicationTask {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub state: Option<TaskStatus>,
}

impl ReplicationTask {
    /// Last-known state; `Unknown` when the API carried no status object.
    pub fn last_state(&self) -> TaskState {
        self.state.as_ref().map(|s| s.state).unwrap_or(TaskState::Unknown)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatus {
    #[serde(default)]
    pub state: TaskState,
    #[serde(default)]
    pub datetime: Option<EpochMillis>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskState {
    Idle,
    Pending,
    Running,
    Finished,
    Error,
    /// Catch-all for state strings this tool does not recognize.
    /// Treated as not yet terminal so an API change cannot crash a run.
    #[serde(other)]
    #[default]
    Unknown,
}

impl TaskState {
    /// FINISHED and ERROR are the states a run stops waiting on.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Finished | TaskState::Error)
    }

    /// RUNNING and PENDING tasks must not be triggered a second time.
    pub fn is_in_flight(self) -> bool {
        matches!(self, TaskState::Running | TaskState::Pending)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TaskState::Idle => "IDLE",
            TaskState::Pending => "PENDING",
            TaskState::Running => "RUNNING",
            TaskState::Finished => "FINISHED",
            TaskState::Error => "ERROR",
            TaskState::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Mongo-extended-JSON timestamp as TrueNAS emits it: `{"$date": <epoch ms>}`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EpochMillis {
    #[serde(rename = "$date")]
    pub millis: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_truenas_task_shape() {
        let task: ReplicationTask = serde_json::from_value(serde_json::json!({
            "id": 7,
            "name": "tank_nightly",
            "direction": "PUSH",
            "state": {
                "state": "RUNNING",
                "datetime": { "$date": 1_699_999_999_123_i64 }
            }
        }))
        .unwrap();

        assert_eq!(task.id, 7);
        assert_eq!(task.name, "tank_nightly");
        assert_eq!(task.last_state(), TaskState::Running);
        assert_eq!(task.state.unwrap().datetime.unwrap().millis, 1_699_999_999_123);
    }

    #[test]
    fn missing_status_is_unknown() {
        let task: ReplicationTask =
            serde_json::from_value(serde_json::json!({ "id": 1, "name": "a" })).unwrap();
        assert!(task.state.is_none());
        assert_eq!(task.last_state(), TaskState::Unknown);
    }

    #[test]
    fn unrecognized_state_string_fails_closed() {
        let task: ReplicationTask = serde_json::from_value(serde_json::json!({
            "id": 1,
            "name": "a",
            "state": { "state": "HOLDING" }
        }))
        .unwrap();

        let state = task.last_state();
        assert_eq!(state, TaskState::Unknown);
        assert!(!state.is_terminal());
        assert!(!state.is_in_flight());
    }

    #[test]
    fn terminal_and_in_flight_partition() {
        assert!(TaskState::Finished.is_terminal());
        assert!(TaskState::Error.is_terminal());
        assert!(!TaskState::Running.is_terminal());

        assert!(TaskState::Running.is_in_flight());
        assert!(TaskState::Pending.is_in_flight());
        assert!(!TaskState::Idle.is_in_flight());
        assert!(!TaskState::Finished.is_in_flight());
    }
}
