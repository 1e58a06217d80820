use amp_types::{ProjectId, RunId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of a run log.
///
/// Serialized with camelCase keys: `{"ts", "runId", "projectId", "kind", "payload"}`.
/// `projectId` and `payload` are omitted when absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunEvent {
    pub ts: DateTime<Utc>,
    pub run_id: RunId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl RunEvent {
    /// Event stamped with the current time.
    pub fn now(
        run_id: RunId,
        project_id: Option<ProjectId>,
        kind: impl Into<String>,
        payload: Option<serde_json::Value>,
    ) -> Self {
        Self {
            ts: Utc::now(),
            run_id,
            project_id,
            kind: kind.into(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_camel_case_fields() {
        let ev = RunEvent::now(
            RunId::from_raw("run_0000abcd"),
            Some(ProjectId::from_raw("proj_00000001")),
            "run.started",
            Some(json!({ "input": "hi" })),
        );
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["runId"], "run_0000abcd");
        assert_eq!(v["projectId"], "proj_00000001");
        assert_eq!(v["kind"], "run.started");
        assert_eq!(v["payload"]["input"], "hi");
        assert!(v["ts"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn absent_fields_are_omitted() {
        let ev = RunEvent::now(RunId::from_raw("run_1"), None, "run.finished", None);
        let v = serde_json::to_value(&ev).unwrap();
        let obj = v.as_object().unwrap();
        assert!(!obj.contains_key("projectId"));
        assert!(!obj.contains_key("payload"));
    }
}
