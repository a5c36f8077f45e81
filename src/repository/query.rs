use crate::repository::snapshot::Repository;
use crate::view::crash::CrashView;
use crate::view::group::CrashGroupDetails;

/// Every group of the snapshot with its member crashes, in snapshot order.
pub fn crash_groups(repo: &Repository) -> Vec<CrashGroupDetails> {
    repo.crash_groups
        .iter()
        .map(|group| CrashGroupDetails::new(repo, group))
        .collect()
}

pub fn unassigned_reports(repo: &Repository) -> Vec<CrashView> {
    repo.crash_reports
        .iter()
        .filter(|report| !report.is_assigned())
        .map(CrashView::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::group::CrashGroup;
    use crate::model::id::EntityId;
    use crate::model::report::CrashReportEnvelope;
    use serde_json::json;

    fn reports(values: serde_json::Value) -> Vec<crate::model::report::CrashReport> {
        serde_json::from_value::<Vec<CrashReportEnvelope>>(values)
            .unwrap()
            .into_iter()
            .map(|e| e.crash_report)
            .collect()
    }

    #[test]
    fn test_one_group_one_unassigned() {
        let repo = Repository {
            crash_groups: vec![serde_json::from_value(json!({"crash_group_id": 1})).unwrap()],
            crash_reports: reports(json!([
                {"crash_report": {"crash_group_id": 1}},
                {"crash_report": {}}
            ])),
            solutions: Vec::new(),
        };

        let groups = crash_groups(&repo);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].crashes.len(), 1);
        assert_eq!(groups[0].count, 1);

        assert_eq!(unassigned_reports(&repo).len(), 1);
    }

    #[test]
    fn test_groups_keep_snapshot_order() {
        let repo = Repository {
            crash_groups: vec![
                CrashGroup {
                    crash_group_id: Some(EntityId::Num(2)),
                    ..CrashGroup::default()
                },
                CrashGroup {
                    crash_group_id: Some(EntityId::Num(1)),
                    ..CrashGroup::default()
                },
            ],
            crash_reports: reports(json!([
                {"crash_report": {"crash_report_id": 10, "crash_group_id": 1}},
                {"crash_report": {"crash_report_id": 11, "crash_group_id": 2}},
                {"crash_report": {"crash_report_id": 12, "crash_group_id": 1}},
                {"crash_report": {"crash_report_id": 13, "crash_group_id": 3}}
            ])),
            solutions: Vec::new(),
        };

        let groups = crash_groups(&repo);
        let members: Vec<Vec<String>> = groups
            .iter()
            .map(|g| g.crashes.iter().map(|c| c.display_id()).collect())
            .collect();

        assert_eq!(members, vec![vec!["11"], vec!["10", "12"]]);
    }

    #[test]
    fn test_unassigned_excludes_assigned_and_keeps_each_once() {
        let repo = Repository {
            crash_reports: reports(json!([
                {"crash_report": {"crash_report_id": 1, "crash_group_id": 0}},
                {"crash_report": {"crash_report_id": 2, "crash_group_id": 5}},
                {"crash_report": {"crash_report_id": 3, "crash_group_id": ""}},
                {"crash_report": {"crash_report_id": 4, "crash_group_id": null}}
            ])),
            ..Repository::default()
        };

        let ids: Vec<String> = unassigned_reports(&repo)
            .iter()
            .map(|c| c.display_id())
            .collect();
        assert_eq!(ids, vec!["1", "3", "4"]);
    }
}
