pub(crate) mod bottom_bar;
pub(crate) mod dashboard;
pub(crate) mod groups;
pub(crate) mod inspect;
pub(crate) mod live;
pub(crate) mod main_view;
pub(crate) mod messages;
