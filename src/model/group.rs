use crate::model::de::deserialize_null_default;
use crate::model::id::{deserialize_optional_id, EntityId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct CrashGroup {
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub crash_group_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crash_group_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<SolutionEnvelope>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Solution {
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub solution_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crash_report_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub shell_script: String,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub crash_group_id: Option<EntityId>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct SolutionEnvelope {
    pub solution: Solution,
}

impl Solution {
    pub fn solves(&self, group_id: &EntityId) -> bool {
        self.crash_group_id.as_ref() == Some(group_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_group_with_solution() {
        let group: CrashGroup = serde_json::from_value(json!({
            "crash_group_id": 4,
            "crash_group_url": "http://host/vd1/crash-groups/4",
            "solution": {
                "solution": {
                    "solution_id": 40,
                    "shell_script": "apt-get install -f",
                    "crash_group_id": 4
                }
            }
        }))
        .unwrap();

        let solution = group.solution.unwrap().solution;
        assert_eq!(solution.shell_script, "apt-get install -f");
        assert!(solution.solves(&EntityId::Num(4)));
        assert!(!solution.solves(&EntityId::Num(5)));
    }

    #[test]
    fn test_parse_bare_group() {
        let group: CrashGroup = serde_json::from_value(json!({})).unwrap();
        assert_eq!(group.crash_group_id, None);
        assert_eq!(group.crash_group_url, None);
        assert!(group.solution.is_none());
    }

    #[test]
    fn test_null_shell_script_reads_as_empty() {
        let solution: Solution = serde_json::from_value(json!({
            "solution_id": 41,
            "shell_script": null,
            "crash_group_id": 4
        }))
        .unwrap();

        assert_eq!(solution.shell_script, "");
        assert!(solution.solves(&EntityId::Num(4)));
    }
}
