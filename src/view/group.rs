use crate::model::group::{CrashGroup, Solution};
use crate::model::id::EntityId;
use crate::repository::snapshot::Repository;
use crate::view::crash::CrashView;

#[derive(Debug, Clone, PartialEq)]
pub struct GroupView {
    pub group_id: Option<EntityId>,
    pub group_url: String,
    pub solution: Option<SolutionView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolutionView {
    pub solution_id: Option<EntityId>,
    pub solution_url: String,
    pub shell_script: String,
    pub group_id: Option<EntityId>,
}

/// A group together with its member crashes and attached solution, derived
/// from one repository snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CrashGroupDetails {
    pub group_id: Option<EntityId>,
    pub group_url: String,
    pub solution: Option<SolutionView>,
    pub solution_name: Option<String>,
    pub crashes: Vec<CrashView>,
    /// Member count when the details were derived. Not updated afterwards.
    pub count: usize,
}

impl GroupView {
    pub fn new(group: &CrashGroup) -> Self {
        GroupView {
            group_id: group.crash_group_id.clone(),
            group_url: group.crash_group_url.clone().unwrap_or_default(),
            solution: group
                .solution
                .as_ref()
                .map(|envelope| SolutionView::new(&envelope.solution)),
        }
    }
}

impl SolutionView {
    pub fn new(solution: &Solution) -> Self {
        SolutionView {
            solution_id: solution.solution_id.clone(),
            solution_url: solution.crash_report_url.clone().unwrap_or_default(),
            shell_script: solution.shell_script.clone(),
            group_id: solution.crash_group_id.clone(),
        }
    }
}

impl CrashGroupDetails {
    pub fn new(repo: &Repository, group: &CrashGroup) -> Self {
        let group_id = group.crash_group_id.clone();

        let solution = group_id
            .as_ref()
            .and_then(|id| repo.solutions.iter().find(|s| s.solves(id)));

        let crashes: Vec<CrashView> = match &group_id {
            Some(id) => repo
                .crash_reports
                .iter()
                .filter(|report| report.belongs_to(id))
                .map(CrashView::new)
                .collect(),
            None => Vec::new(),
        };

        CrashGroupDetails {
            group_url: group.crash_group_url.clone().unwrap_or_default(),
            solution: solution.map(SolutionView::new),
            solution_name: solution.map(|s| s.shell_script.clone()),
            count: crashes.len(),
            crashes,
            group_id,
        }
    }

    /// Details of a group that was just created and has no members yet.
    pub fn empty(group: &CrashGroup) -> Self {
        CrashGroupDetails {
            group_id: group.crash_group_id.clone(),
            group_url: group.crash_group_url.clone().unwrap_or_default(),
            solution: None,
            solution_name: None,
            crashes: Vec::new(),
            count: 0,
        }
    }

    pub fn has_solution(&self) -> bool {
        self.solution.is_some()
    }
}
