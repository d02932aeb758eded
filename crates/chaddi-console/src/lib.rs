//! Client library behind the `chaddi-console` terminal admin console.
//!
//! The controllers ([`Messenger`], [`LiveActivity`], [`Dashboard`]) own all
//! view state and never perform I/O. They hand out [`FetchRequest`]s for the
//! [`FetchWorker`] and [`push::Emit`]s for the [`PushClient`]; responses and
//! pushed events are applied back on the owning thread.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod deeplink;
pub mod error;
pub mod feed;
pub mod format;
pub mod live;
pub mod logline;
pub mod messenger;
pub mod models;
pub mod paging;
pub mod push;
pub mod report;
pub mod worker;

pub use api::{ConsoleApi, HttpApi};
pub use config::Settings;
pub use dashboard::{Dashboard, Widget};
pub use deeplink::{DeepLink, Resolution};
pub use error::{ConsoleError, Result};
pub use feed::{BoundedFeed, Category, FeedItem, Filter, DEFAULT_FEED_LIMIT};
pub use live::{ConnectionStatus, LiveActivity, LiveItem};
pub use logline::{LogLevel, LogLine};
pub use messenger::{Messenger, MessengerUpdate};
pub use models::{Group, Message};
pub use paging::{Completion, Page, PageCursor, PageOrder, PageTicket, PagedList};
pub use push::{Emit, PushClient, PushConfig, PushEvent};
pub use report::Format;
pub use worker::{FetchRequest, FetchResponse, FetchWorker};
