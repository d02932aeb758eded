pub(crate) mod formatters;
