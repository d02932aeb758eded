/// Top-level screens, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tab {
    Dashboard,
    Groups,
    Live,
}

impl Tab {
    pub(crate) const ALL: [Tab; 3] = [Tab::Dashboard, Tab::Groups, Tab::Live];

    pub(crate) fn title(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Groups => "Groups",
            Tab::Live => "Live",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Tab::Dashboard => 0,
            Tab::Groups => 1,
            Tab::Live => 2,
        }
    }

    pub(crate) fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub(crate) fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Represents which UI component has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Focus {
    Groups,
    Messages,
    Live,
    Inspect,
}

/// Content of the inspect popup, captured when it is opened.
#[derive(Debug, Clone)]
pub(crate) struct Inspected {
    pub(crate) title: String,
    pub(crate) body: String,
    /// Focus to restore on close.
    pub(crate) return_to: Focus,
}
