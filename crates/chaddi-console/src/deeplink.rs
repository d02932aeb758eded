use crate::models::Group;
use crate::paging::PagedList;

/// Outcome of checking the loaded groups against a pending deep link.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// No deep link pending.
    Idle,
    Found(Group),
    /// Not loaded yet and more pages remain.
    FetchMore,
    /// Every page was searched.
    NotFound,
}

/// A group id requested out-of-band (e.g. `--group-id`), resolved against
/// the group list as pages arrive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeepLink {
    target: Option<String>,
}

impl DeepLink {
    pub fn new(target: Option<String>) -> Self {
        let target = target
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Self { target }
    }

    pub fn pending(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Called after each successful groups page. `Found` and `NotFound`
    /// consume the target. Terminates because `has_more` only ever turns false
    /// as pages are consumed.
    pub fn resolve(&mut self, groups: &PagedList<Group>) -> Resolution {
        let Some(target) = self.target.as_deref() else {
            return Resolution::Idle;
        };
        if let Some(group) = groups.items().iter().find(|g| g.group_id == target) {
            let group = group.clone();
            self.target = None;
            return Resolution::Found(group);
        }
        if groups.has_more() {
            return Resolution::FetchMore;
        }
        self.target = None;
        Resolution::NotFound
    }
}
