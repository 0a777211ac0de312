//! Message dispatcher.
//!
//! The [`Dispatcher`] owns the ordered handler chain. For every inbound
//! message it:
//!
//! 1. Builds a [`Request`](crate::Request) through the [`RequestBuilder`]
//! 2. Wraps it in a shared [`MessageContext`]
//! 3. Calls handlers in registration order until one reports
//!    [`Outcome::Handled`]
//!
//! If the request cannot be built (unknown sender, directory failure) no
//! handler runs.
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::new(directory, transport, own_user_id)
//!     .with(plusplus)
//!     .with(echo)
//!     .with(snark);
//!
//! match dispatcher.dispatch(message).await {
//!     Dispatched::Handled { handler } => debug!(%handler, "consumed"),
//!     Dispatched::Unhandled | Dispatched::Aborted => {}
//! }
//! ```

use std::sync::Arc;

use tower::{BoxError, Service, ServiceExt};
use tower::util::BoxCloneSyncService;
use tracing::{Instrument, Level, debug, error, span, warn};

use karma_core::{BoxedTransport, Directory, InboundMessage};

use crate::context::{MessageContext, Response};
use crate::handler::{BoxedHandlerService, Handler, HandlerService, Outcome};
use crate::request::RequestBuilder;

/// How a single dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// The named handler consumed the message.
    Handled { handler: String },
    /// Every handler passed.
    Unhandled,
    /// The request could not be built; no handler ran.
    Aborted,
}

/// The ordered handler chain plus everything needed to build requests.
///
/// `Dispatcher` is `Clone`; clones share the directory and transport and copy
/// the (cheaply cloneable) handler list, so one clone per task is fine.
#[derive(Clone)]
pub struct Dispatcher {
    builder: RequestBuilder,
    transport: BoxedTransport,
    handlers: Vec<(String, BoxedHandlerService)>,
}

impl Dispatcher {
    /// Creates a dispatcher with an empty chain.
    pub fn new(directory: Arc<dyn Directory>, transport: BoxedTransport, own_user_id: i64) -> Self {
        Self {
            builder: RequestBuilder::new(directory, own_user_id),
            transport,
            handlers: Vec::new(),
        }
    }

    /// Appends a handler to the end of the chain.
    pub fn register<H: Handler>(&mut self, handler: H) {
        let svc = HandlerService::new(handler);
        let name = svc.name().to_string();
        self.handlers.push((name, BoxCloneSyncService::new(svc)));
    }

    /// Appends a handler to the end of the chain (builder pattern).
    pub fn with<H: Handler>(mut self, handler: H) -> Self {
        self.register(handler);
        self
    }

    /// Appends an arbitrary tower service, typically a [`HandlerService`]
    /// with layers stacked on top.
    pub fn register_service<S>(&mut self, name: impl Into<String>, service: S)
    where
        S: Service<Arc<MessageContext>, Response = Outcome, Error = BoxError>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        self.handlers
            .push((name.into(), BoxCloneSyncService::new(service)));
    }

    /// Returns handler names in chain order.
    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn own_user_id(&self) -> i64 {
        self.builder.own_user_id()
    }

    /// Runs one inbound message through the chain.
    pub async fn dispatch(&self, inbound: InboundMessage) -> Dispatched {
        let span = span!(
            Level::DEBUG,
            "dispatch",
            channel = %inbound.channel,
            from = %inbound.from
        );
        self.dispatch_inner(inbound).instrument(span).await
    }

    async fn dispatch_inner(&self, inbound: InboundMessage) -> Dispatched {
        let request = match self.builder.build(&inbound).await {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Could not resolve message identities, dropping");
                return Dispatched::Aborted;
            }
        };

        let response = Response::new(request.channel(), Arc::clone(&self.transport));
        let ctx = MessageContext::new(request, response).into_shared();

        for (name, service) in &self.handlers {
            match service.clone().oneshot(Arc::clone(&ctx)).await {
                Ok(Outcome::Continue) => continue,
                Ok(Outcome::Handled) => {
                    debug!(handler = %name, "Message handled");
                    return Dispatched::Handled {
                        handler: name.clone(),
                    };
                }
                Err(e) => {
                    error!(handler = %name, error = %e, "Handler service failed, stopping chain");
                    return Dispatched::Handled {
                        handler: name.clone(),
                    };
                }
            }
        }

        debug!("No handler consumed the message");
        Dispatched::Unhandled
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("own_user_id", &self.builder.own_user_id())
            .field("handlers", &self.handler_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use async_trait::async_trait;
    use karma_core::{
        MatchKind, NameField, RecordingTransport, RosterEntry, StoreError, StoreResult, User,
    };
    use karma_store::SqliteStore;
    use std::sync::Mutex;

    const BOT_ID: i64 = 99;

    /// Ordered record of which handlers ran.
    #[derive(Clone, Default)]
    struct Log(Arc<Mutex<Vec<String>>>);

    impl Log {
        fn push(&self, entry: &str) {
            self.0.lock().unwrap().push(entry.to_string());
        }

        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    async fn directory() -> Arc<SqliteStore> {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .refresh_roster(&[
                RosterEntry::new("1_1@chat.example.com", "Alice Liddell", "alice"),
                RosterEntry::new("1_99@chat.example.com", "Karma Bot", "karma"),
            ])
            .await
            .unwrap();
        Arc::new(store)
    }

    fn recording(log: &Log, name: &'static str, outcome: Outcome) -> impl Handler {
        let log = log.clone();
        handler_fn(name, move |_ctx| {
            let log = log.clone();
            async move {
                log.push(name);
                outcome
            }
        })
    }

    struct FailingDirectory;

    #[async_trait]
    impl Directory for FailingDirectory {
        async fn find_by_display_name(&self, _name: &str) -> StoreResult<Option<User>> {
            Err(StoreError::Database("database is locked".into()))
        }

        async fn find_by_mention_name(&self, _name: &str) -> StoreResult<Option<User>> {
            Err(StoreError::Database("database is locked".into()))
        }

        async fn find_by_id(&self, _id: i64) -> StoreResult<Option<User>> {
            Ok(None)
        }

        async fn find_by_jid(&self, _jid: &str) -> StoreResult<Option<User>> {
            Ok(None)
        }

        async fn search(
            &self,
            _field: NameField,
            _kind: MatchKind,
            _fragment: &str,
        ) -> StoreResult<Vec<User>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_dispatch_no_handlers() {
        let dispatcher = Dispatcher::new(
            directory().await,
            Arc::new(RecordingTransport::new()),
            BOT_ID,
        );
        let result = dispatcher
            .dispatch(InboundMessage::new("lobby", "Alice Liddell", "hi"))
            .await;
        assert_eq!(result, Dispatched::Unhandled);
    }

    #[tokio::test]
    async fn test_handlers_run_in_order_until_handled() {
        let log = Log::default();
        let dispatcher = Dispatcher::new(
            directory().await,
            Arc::new(RecordingTransport::new()),
            BOT_ID,
        )
        .with(recording(&log, "first", Outcome::Continue))
        .with(recording(&log, "second", Outcome::Handled))
        .with(recording(&log, "third", Outcome::Handled));

        assert_eq!(dispatcher.handler_names(), vec!["first", "second", "third"]);

        let result = dispatcher
            .dispatch(InboundMessage::new("lobby", "Alice Liddell", "hi"))
            .await;

        assert_eq!(
            result,
            Dispatched::Handled {
                handler: "second".into()
            }
        );
        assert_eq!(log.entries(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_all_continue_is_unhandled() {
        let log = Log::default();
        let dispatcher = Dispatcher::new(
            directory().await,
            Arc::new(RecordingTransport::new()),
            BOT_ID,
        )
        .with(recording(&log, "a", Outcome::Continue))
        .with(recording(&log, "b", Outcome::Continue));

        let result = dispatcher
            .dispatch(InboundMessage::new("lobby", "Alice Liddell", "hi"))
            .await;

        assert_eq!(result, Dispatched::Unhandled);
        assert_eq!(log.entries(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_handled_without_reply_stops_chain() {
        let log = Log::default();
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = Dispatcher::new(directory().await, transport.clone(), BOT_ID)
            .with(recording(&log, "silent", Outcome::Handled))
            .with(recording(&log, "never", Outcome::Handled));

        dispatcher
            .dispatch(InboundMessage::new("lobby", "Alice Liddell", "hi"))
            .await;

        assert_eq!(log.entries(), vec!["silent"]);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_sender_aborts() {
        let log = Log::default();
        let dispatcher = Dispatcher::new(
            directory().await,
            Arc::new(RecordingTransport::new()),
            BOT_ID,
        )
        .with(recording(&log, "any", Outcome::Handled));

        let result = dispatcher
            .dispatch(InboundMessage::new("lobby", "Stranger", "hi"))
            .await;

        assert_eq!(result, Dispatched::Aborted);
        assert!(log.entries().is_empty());
    }

    #[tokio::test]
    async fn test_directory_failure_aborts() {
        let log = Log::default();
        let dispatcher = Dispatcher::new(
            Arc::new(FailingDirectory),
            Arc::new(RecordingTransport::new()),
            BOT_ID,
        )
        .with(recording(&log, "any", Outcome::Handled));

        let result = dispatcher
            .dispatch(InboundMessage::new("lobby", "Alice Liddell", "hi"))
            .await;

        assert_eq!(result, Dispatched::Aborted);
        assert!(log.entries().is_empty());
    }

    #[tokio::test]
    async fn test_context_carries_stripped_message_and_replies_to_channel() {
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = Dispatcher::new(directory().await, transport.clone(), BOT_ID).with(
            handler_fn("probe", |ctx: Arc<MessageContext>| async move {
                let req = ctx.request();
                let text = format!(
                    "{}|{}|{}",
                    req.message(),
                    req.to_own_user(),
                    req.from_user().mention_name
                );
                ctx.respond(&text).await;
                Outcome::Handled
            }),
        );

        dispatcher
            .dispatch(InboundMessage::new("room-7", "Alice Liddell", "@karma echo hi"))
            .await;

        assert_eq!(
            transport.sent(),
            vec![("room-7".to_string(), "echo hi|true|alice".to_string())]
        );
    }

    #[tokio::test]
    async fn test_service_error_stops_chain() {
        let log = Log::default();
        let mut dispatcher = Dispatcher::new(
            directory().await,
            Arc::new(RecordingTransport::new()),
            BOT_ID,
        );
        dispatcher.register_service(
            "broken",
            tower::service_fn(|_ctx: Arc<MessageContext>| async {
                Err::<Outcome, BoxError>("boom".into())
            }),
        );
        dispatcher.register(recording(&log, "after", Outcome::Handled));

        let result = dispatcher
            .dispatch(InboundMessage::new("lobby", "Alice Liddell", "hi"))
            .await;

        assert_eq!(
            result,
            Dispatched::Handled {
                handler: "broken".into()
            }
        );
        assert!(log.entries().is_empty());
    }
}
