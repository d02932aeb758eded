use tracing::debug;

use crate::models::{Activity, Health, Metrics, Quote, VersionInfo};
use crate::worker::{FetchRequest, FetchResponse};

/// Load state of one dashboard card.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Widget<T> {
    #[default]
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Widget<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Widget::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Widget::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Widget::Loading)
    }
}

impl<T> From<Result<T, String>> for Widget<T> {
    fn from(result: Result<T, String>) -> Self {
        match result {
            Ok(value) => Widget::Ready(value),
            Err(message) => Widget::Failed(message),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub metrics: Widget<Metrics>,
    pub activity: Widget<Activity>,
    pub quote: Widget<Option<Quote>>,
    pub version: Widget<VersionInfo>,
    pub health: Widget<Health>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts every card back into `Loading` and returns the fetches to run.
    pub fn refresh(&mut self) -> Vec<FetchRequest> {
        *self = Self::default();
        vec![
            FetchRequest::Metrics,
            FetchRequest::Activity,
            FetchRequest::RandomQuote,
            FetchRequest::Version,
            FetchRequest::Health,
        ]
    }

    /// Returns true when the response belonged to the dashboard.
    pub fn apply(&mut self, response: FetchResponse) -> bool {
        match response {
            FetchResponse::Metrics(result) => self.metrics = result.into(),
            FetchResponse::Activity(result) => self.activity = result.into(),
            FetchResponse::RandomQuote(result) => {
                // a failed quote simply hides the card
                self.quote = match result {
                    Ok(quote) => Widget::Ready(quote),
                    Err(error) => {
                        debug!(%error, "random quote unavailable");
                        Widget::Ready(None)
                    }
                }
            }
            FetchResponse::Version(result) => self.version = result.into(),
            FetchResponse::Health(result) => self.health = result.into(),
            _ => return false,
        }
        true
    }

    /// The quote card is shown only when a quote came back.
    pub fn visible_quote(&self) -> Option<&Quote> {
        self.quote.ready().and_then(Option::as_ref)
    }

    pub fn is_loading(&self) -> bool {
        self.metrics.is_loading()
            || self.activity.is_loading()
            || self.quote.is_loading()
            || self.version.is_loading()
            || self.health.is_loading()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paging::{PageOrder, PagedList};
    use crate::models::Group;
    use crate::worker::GroupsFetch;

    #[test]
    fn test_refresh_requests_every_card() {
        let mut dashboard = Dashboard::new();
        dashboard.metrics = Widget::Failed("old".into());
        let requests = dashboard.refresh();
        assert_eq!(requests.len(), 5);
        assert!(requests.contains(&FetchRequest::RandomQuote));
        assert!(dashboard.metrics.is_loading());
    }

    #[test]
    fn test_failures_are_isolated() {
        let mut dashboard = Dashboard::new();
        dashboard.refresh();
        assert!(dashboard.apply(FetchResponse::Metrics(Err("boom".into()))));
        assert!(dashboard.apply(FetchResponse::Activity(Ok(Activity::default()))));

        assert_eq!(dashboard.metrics.error(), Some("boom"));
        assert!(dashboard.activity.ready().is_some());
        assert!(dashboard.version.is_loading());
        assert!(dashboard.is_loading());
    }

    #[test]
    fn test_quote_failure_is_silent() {
        let mut dashboard = Dashboard::new();
        dashboard.apply(FetchResponse::RandomQuote(Err("502".into())));
        assert_eq!(dashboard.quote, Widget::Ready(None));
        assert_eq!(dashboard.visible_quote(), None);

        let quote = Quote {
            text: Some("kuch bhi".into()),
            ..Quote::default()
        };
        dashboard.apply(FetchResponse::RandomQuote(Ok(Some(quote.clone()))));
        assert_eq!(dashboard.visible_quote(), Some(&quote));
    }

    #[test]
    fn test_ignores_list_responses() {
        let mut dashboard = Dashboard::new();
        let mut list: PagedList<Group> = PagedList::new(PageOrder::Forward);
        let ticket = list.begin().unwrap();
        assert!(!dashboard.apply(FetchResponse::Groups {
            ticket,
            result: Err::<GroupsFetch, _>("x".into()),
        }));
    }
}
