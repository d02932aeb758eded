//! Background REST fetches.
//!
//! Controllers describe what they need as [`FetchRequest`]s; worker threads
//! run them against a [`ConsoleApi`] and hand back [`FetchResponse`]s, which
//! the UI thread drains and applies. Results carry errors as display strings
//! so they can be stored by the renderer.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, warn};

use crate::api::ConsoleApi;
use crate::error::{ConsoleError, Result};
use crate::models::{Activity, Group, Health, Message, Metrics, Quote, VersionInfo};
use crate::paging::{Page, PageTicket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Metrics,
    Activity,
    RandomQuote,
    Version,
    Health,
    Groups { ticket: PageTicket },
    Messages { group_id: String, ticket: PageTicket },
}

/// A page of groups plus the server-side total.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupsFetch {
    pub page: Page<Group>,
    pub total_groups: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchResponse {
    Metrics(Result<Metrics, String>),
    Activity(Result<Activity, String>),
    RandomQuote(Result<Option<Quote>, String>),
    Version(Result<VersionInfo, String>),
    Health(Result<Health, String>),
    Groups {
        ticket: PageTicket,
        result: Result<GroupsFetch, String>,
    },
    Messages {
        group_id: String,
        ticket: PageTicket,
        result: Result<Page<Message>, String>,
    },
}

/// Runs one request on the calling thread.
pub fn execute(api: &dyn ConsoleApi, request: FetchRequest) -> FetchResponse {
    fn flat<T>(result: Result<T>) -> Result<T, String> {
        result.map_err(|e| e.to_string())
    }

    match request {
        FetchRequest::Metrics => FetchResponse::Metrics(flat(api.metrics())),
        FetchRequest::Activity => FetchResponse::Activity(flat(api.activity())),
        FetchRequest::RandomQuote => FetchResponse::RandomQuote(flat(api.random_quote())),
        FetchRequest::Version => FetchResponse::Version(flat(api.version())),
        FetchRequest::Health => FetchResponse::Health(flat(api.health())),
        FetchRequest::Groups { ticket } => FetchResponse::Groups {
            ticket,
            result: flat(api.groups(ticket.page)).map(|body| GroupsFetch {
                page: Page {
                    items: body.groups,
                    total_pages: body.total_pages,
                },
                total_groups: body.total_groups,
            }),
        },
        FetchRequest::Messages { group_id, ticket } => {
            let result = flat(api.group_messages(&group_id, ticket.page)).map(|body| Page {
                items: body.messages,
                total_pages: body.total_pages,
            });
            FetchResponse::Messages {
                group_id,
                ticket,
                result,
            }
        }
    }
}

impl FetchResponse {
    pub fn is_err(&self) -> bool {
        match self {
            FetchResponse::Metrics(r) => r.is_err(),
            FetchResponse::Activity(r) => r.is_err(),
            FetchResponse::RandomQuote(r) => r.is_err(),
            FetchResponse::Version(r) => r.is_err(),
            FetchResponse::Health(r) => r.is_err(),
            FetchResponse::Groups { result, .. } => result.is_err(),
            FetchResponse::Messages { result, .. } => result.is_err(),
        }
    }
}

/// Pool of fetch threads sharing one request queue.
pub struct FetchWorker {
    requests: Option<Sender<FetchRequest>>,
    responses: Receiver<FetchResponse>,
    handles: Vec<JoinHandle<()>>,
}

impl FetchWorker {
    /// Spawns `threads` workers (at least one). Independent dashboard widgets
    /// load concurrently when more than one is running.
    pub fn spawn(api: Arc<dyn ConsoleApi>, threads: usize) -> Result<Self> {
        let (request_tx, request_rx) = unbounded::<FetchRequest>();
        let (response_tx, response_rx) = unbounded::<FetchResponse>();

        let mut handles = Vec::new();
        for n in 0..threads.max(1) {
            let api = Arc::clone(&api);
            let request_rx = request_rx.clone();
            let response_tx = response_tx.clone();
            let handle = std::thread::Builder::new()
                .name(format!("chaddi-fetch-worker-{}", n))
                .spawn(move || {
                    while let Ok(request) = request_rx.recv() {
                        debug!(?request, "fetch");
                        let response = execute(api.as_ref(), request);
                        if response.is_err() {
                            warn!(?response, "fetch failed");
                        }
                        if response_tx.send(response).is_err() {
                            break;
                        }
                    }
                })?;
            handles.push(handle);
        }

        Ok(Self {
            requests: Some(request_tx),
            responses: response_rx,
            handles,
        })
    }

    pub fn submit(&self, request: FetchRequest) -> Result<()> {
        self.requests
            .as_ref()
            .ok_or(ConsoleError::Disconnected)?
            .send(request)
            .map_err(|_| ConsoleError::Disconnected)
    }

    pub fn submit_all(&self, requests: impl IntoIterator<Item = FetchRequest>) -> Result<()> {
        for request in requests {
            self.submit(request)?;
        }
        Ok(())
    }

    /// Responses that have arrived since the last call, without blocking.
    pub fn drain(&self) -> Vec<FetchResponse> {
        self.responses.try_iter().collect()
    }

    pub fn responses(&self) -> &Receiver<FetchResponse> {
        &self.responses
    }

    /// Closes the request queue and waits for in-flight fetches to finish.
    pub fn shutdown(mut self) {
        self.requests.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GroupsPage, MessagesPage};
    use crate::paging::{PageOrder, PagedList};
    use std::time::Duration;

    struct FakeApi;

    impl ConsoleApi for FakeApi {
        fn metrics(&self) -> Result<Metrics> {
            Ok(Metrics {
                messages_count: Some(12),
                ..Metrics::default()
            })
        }
        fn activity(&self) -> Result<Activity> {
            Err(ConsoleError::Status {
                endpoint: "/api/dashboard/activity".into(),
                status: 500,
            })
        }
        fn random_quote(&self) -> Result<Option<Quote>> {
            Ok(None)
        }
        fn version(&self) -> Result<VersionInfo> {
            Ok(VersionInfo::default())
        }
        fn health(&self) -> Result<Health> {
            Ok(Health {
                health: "ok".into(),
            })
        }
        fn groups(&self, page_number: u32) -> Result<GroupsPage> {
            Ok(GroupsPage {
                groups: vec![Group {
                    group_id: format!("g{}", page_number),
                    name: None,
                    created: None,
                    updated: None,
                }],
                total_groups: Some(2),
                total_pages: 2,
            })
        }
        fn group_messages(&self, _group_id: &str, _page_number: u32) -> Result<MessagesPage> {
            Ok(MessagesPage::default())
        }
        fn update_rokda(&self, _bakchod_id: &str, _rokda: &str) -> Result<String> {
            Ok(String::new())
        }
        fn update_metadata(&self, _bakchod_id: &str, _metadata: &str) -> Result<String> {
            Ok(String::new())
        }
        fn send_message(&self, _chat_id: &str, _text: &str) -> Result<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn test_execute_maps_errors_to_strings() {
        match execute(&FakeApi, FetchRequest::Activity) {
            FetchResponse::Activity(Err(message)) => {
                assert_eq!(message, "/api/dashboard/activity returned HTTP 500")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_execute_groups_carries_ticket() {
        let mut list: PagedList<Group> = PagedList::new(PageOrder::Forward);
        let ticket = list.begin().unwrap();
        match execute(&FakeApi, FetchRequest::Groups { ticket }) {
            FetchResponse::Groups { ticket: t, result } => {
                assert_eq!(t, ticket);
                let fetch = result.unwrap();
                assert_eq!(fetch.page.items[0].group_id, "g1");
                assert_eq!(fetch.total_groups, Some(2));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_worker_round_trip() {
        let worker = FetchWorker::spawn(Arc::new(FakeApi), 2).unwrap();
        worker
            .submit_all([FetchRequest::Metrics, FetchRequest::Health])
            .unwrap();

        let mut got = Vec::new();
        while got.len() < 2 {
            got.push(
                worker
                    .responses()
                    .recv_timeout(Duration::from_secs(5))
                    .unwrap(),
            );
        }
        assert!(got.iter().any(|r| matches!(r, FetchResponse::Metrics(Ok(m)) if m.messages_count == Some(12))));
        assert!(got.iter().any(|r| matches!(r, FetchResponse::Health(Ok(h)) if h.health == "ok")));
        worker.shutdown();
    }
}
