//! Authenticated WebSocket session against the host.
//!
//! A [`HostConnection`] performs the `auth_required` / `auth` / `auth_ok`
//! handshake, then splits the socket between two background tasks:
//!
//! - a writer that drains an unbounded queue of outbound frames;
//! - a reader that routes `result` frames to the waiting caller by message
//!   id and folds `state_changed` events into a full snapshot published
//!   through a [`tokio::sync::watch`] channel.
//!
//! Both tasks stop when the connection's [`CancellationToken`] fires or the
//! socket closes. Requests still waiting at that point fail with
//! [`Error::WebSocketClosed`].
//!
//! ```rust,ignore
//! let conn = HostConnection::connect(&url, &token, &TransportConfig::default()).await?;
//! let mut states = conn.subscribe_states().await?;
//! while states.changed().await.is_ok() {
//!     println!("{} entities", states.borrow().len());
//! }
//! ```

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tokio::sync::{mpsc, oneshot, watch};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::protocol::{
    HostState, Inbound, RpcError, StateChange, StateMap, apply_state_change, auth_message, command,
};
use crate::transport::{TransportConfig, websocket_url};

/// Shared, immutable view of every entity the host currently reports.
pub type StateSnapshot = Arc<StateMap>;

type Reply = oneshot::Sender<Result<Value, Error>>;

const LOAD_CONFIG: &str = "dashstyle/config/load";
const SAVE_CONFIG: &str = "dashstyle/config/save";

// ── HostConnection ───────────────────────────────────────────────────

/// Handle to a live, authenticated host session.
///
/// Dropping the handle cancels the background tasks.
pub struct HostConnection {
    inner: Arc<Inner>,
    cancel: CancellationToken,
}

struct Inner {
    outbound: mpsc::UnboundedSender<Message>,
    pending: Mutex<HashMap<u64, Reply>>,
    next_id: AtomicU64,
    feed: Mutex<StateFeed>,
    timeout: Duration,
}

impl HostConnection {
    /// Connect, authenticate and start the reader/writer tasks.
    ///
    /// The connect and the handshake are each bounded by the transport
    /// timeout.
    pub async fn connect(
        base_url: &Url,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let ws_url = websocket_url(base_url)?;
        let timeout_secs = transport.timeout_secs();
        tracing::info!(url = %ws_url, "connecting to host websocket");

        let (stream, _response) =
            tokio::time::timeout(transport.timeout, tokio_tungstenite::connect_async(ws_url.as_str()))
                .await
                .map_err(|_| Error::Timeout { timeout_secs })?
                .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        let (mut write, mut read) = stream.split();
        tokio::time::timeout(transport.timeout, authenticate(&mut write, &mut read, token))
            .await
            .map_err(|_| Error::Timeout { timeout_secs })??;

        tracing::info!("host websocket authenticated");

        let cancel = CancellationToken::new();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner::new(outbound_tx, transport.timeout));

        tokio::spawn(write_loop(write, outbound_rx, cancel.clone()));
        tokio::spawn(read_loop(read, Arc::clone(&inner), cancel.clone()));

        Ok(Self { inner, cancel })
    }

    /// Send a command and wait for its `result` frame.
    ///
    /// `payload` members are merged into the frame next to `id` and `type`.
    pub async fn call(&self, kind: &str, payload: Value) -> Result<Value, Error> {
        let id = self.inner.allocate_id();
        self.send_command(id, kind, payload).await
    }

    /// Fetch the stored dashboard document. `Value::Null` means nothing has
    /// been saved yet.
    pub async fn load_config(&self) -> Result<Value, Error> {
        self.call(LOAD_CONFIG, Value::Null).await
    }

    /// Persist the full dashboard document.
    pub async fn save_config(&self, config: &Value) -> Result<(), Error> {
        let reply = self.call(SAVE_CONFIG, json!({ "config": config })).await?;
        if reply.get("success").and_then(Value::as_bool) == Some(true) {
            Ok(())
        } else {
            Err(Error::Rpc {
                code: "save_rejected".into(),
                message: "Save operation returned success: false".into(),
            })
        }
    }

    pub async fn get_states(&self) -> Result<Vec<HostState>, Error> {
        let value = self.call("get_states", Value::Null).await?;
        serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: value.to_string(),
        })
    }

    /// Subscribe to `state_changed` events and seed the snapshot from
    /// `get_states`.
    ///
    /// The returned receiver always holds the full current snapshot.
    pub async fn subscribe_states(&self) -> Result<watch::Receiver<StateSnapshot>, Error> {
        let id = self.inner.allocate_id();
        // Registered before sending so no event for this id is dropped.
        self.inner.feed().subscribe(id);
        self.send_command(id, "subscribe_events", json!({ "event_type": "state_changed" }))
            .await?;

        let states = self.get_states().await?;
        let mut feed = self.inner.feed();
        feed.seed(states);
        Ok(feed.tx.subscribe())
    }

    /// The latest published snapshot (empty before `subscribe_states`).
    pub fn states(&self) -> StateSnapshot {
        Arc::clone(&self.inner.feed().tx.borrow())
    }

    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        entity_id: &str,
    ) -> Result<(), Error> {
        self.call(
            "call_service",
            json!({
                "domain": domain,
                "service": service,
                "service_data": { "entity_id": entity_id },
            }),
        )
        .await
        .map(|_| ())
    }

    /// Stop the background tasks. Outstanding requests fail.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    async fn send_command(&self, id: u64, kind: &str, payload: Value) -> Result<Value, Error> {
        let (tx, rx) = oneshot::channel();
        self.inner.pending().insert(id, tx);
        tracing::debug!(id, kind, "host command");

        let frame = Message::Text(command(id, kind, payload).into());
        if self.inner.outbound.send(frame).is_err() {
            self.inner.pending().remove(&id);
            return Err(Error::WebSocketClosed {
                reason: "connection writer stopped".into(),
            });
        }

        match tokio::time::timeout(self.inner.timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(Error::WebSocketClosed {
                reason: "connection dropped before reply".into(),
            }),
            Err(_) => {
                self.inner.pending().remove(&id);
                tracing::warn!(id, kind, "host command timed out");
                Err(Error::Timeout {
                    timeout_secs: self.inner.timeout.as_secs(),
                })
            }
        }
    }
}

impl Drop for HostConnection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Shared state ─────────────────────────────────────────────────────

impl Inner {
    fn new(outbound: mpsc::UnboundedSender<Message>, timeout: Duration) -> Self {
        let (tx, _rx) = watch::channel(StateSnapshot::default());
        Self {
            outbound,
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            feed: Mutex::new(StateFeed {
                subscription: None,
                states: StateMap::new(),
                early: None,
                tx,
            }),
            timeout,
        }
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<u64, Reply>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn feed(&self) -> MutexGuard<'_, StateFeed> {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Route one inbound text frame.
    fn dispatch(&self, text: &str) {
        let frame = match Inbound::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(error = %e, "unparseable host frame");
                return;
            }
        };

        match frame {
            Inbound::Result {
                id,
                success,
                result,
                error,
            } => {
                let outcome = if success {
                    Ok(result)
                } else {
                    let RpcError { code, message } = error.unwrap_or(RpcError {
                        code: "unknown_error".into(),
                        message: String::new(),
                    });
                    Err(Error::Rpc { code, message })
                };
                let waiter = self.pending().remove(&id);
                match waiter {
                    Some(reply) => {
                        let _ = reply.send(outcome);
                    }
                    None => tracing::trace!(id, "result for unknown request"),
                }
            }
            Inbound::Event { id, event } => self.feed().handle_event(id, &event),
            Inbound::Pong { id } => tracing::trace!(id, "pong"),
            Inbound::AuthRequired { .. } | Inbound::AuthOk { .. } | Inbound::AuthInvalid { .. } => {
                tracing::debug!("handshake frame after authentication");
            }
            Inbound::Unknown => {}
        }
    }

    fn fail_pending(&self, reason: &str) {
        let drained: Vec<Reply> = self.pending().drain().map(|(_, reply)| reply).collect();
        for reply in drained {
            let _ = reply.send(Err(Error::WebSocketClosed {
                reason: reason.to_owned(),
            }));
        }
    }
}

struct StateFeed {
    subscription: Option<u64>,
    states: StateMap,
    /// Changes received after subscribing but before the `get_states`
    /// seed. `None` once seeded.
    early: Option<Vec<StateChange>>,
    tx: watch::Sender<StateSnapshot>,
}

impl StateFeed {
    fn subscribe(&mut self, id: u64) {
        self.subscription = Some(id);
        self.early = Some(Vec::new());
    }

    fn handle_event(&mut self, id: u64, event: &Value) {
        if self.subscription != Some(id) {
            tracing::trace!(id, "event for unknown subscription");
            return;
        }
        let Some(change) = StateChange::from_event(event) else {
            return;
        };
        tracing::trace!(entity_id = %change.entity_id, "state changed");
        if let Some(early) = self.early.as_mut() {
            early.push(change);
            return;
        }
        apply_state_change(&mut self.states, change);
        self.publish();
    }

    /// Replace the snapshot with `states`, then replay the changes that
    /// arrived while the `get_states` reply was in flight.
    fn seed(&mut self, states: Vec<HostState>) {
        self.states = states
            .into_iter()
            .map(|state| (state.entity_id.clone(), state))
            .collect();
        let early = self.early.take().unwrap_or_default();
        let replayed = early.len();
        for change in early {
            apply_state_change(&mut self.states, change);
        }
        tracing::debug!(entities = self.states.len(), replayed, "state snapshot seeded");
        self.publish();
    }

    fn publish(&self) {
        self.tx.send_replace(Arc::new(self.states.clone()));
    }
}

// ── Handshake ────────────────────────────────────────────────────────

async fn authenticate<W, R>(write: &mut W, read: &mut R, token: &SecretString) -> Result<(), Error>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
    R: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    match next_inbound(read).await? {
        Inbound::AuthRequired { ha_version } => {
            tracing::debug!(ha_version = ?ha_version, "auth required");
        }
        other => {
            return Err(Error::Protocol(format!(
                "expected auth_required, got {other:?}"
            )));
        }
    }

    write
        .send(Message::Text(auth_message(token.expose_secret()).into()))
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    match next_inbound(read).await? {
        Inbound::AuthOk { .. } => Ok(()),
        Inbound::AuthInvalid { message } => Err(Error::Authentication {
            message: message.unwrap_or_else(|| "access token rejected".into()),
        }),
        other => Err(Error::Protocol(format!(
            "expected auth_ok or auth_invalid, got {other:?}"
        ))),
    }
}

/// Read frames until the next text frame and decode it.
async fn next_inbound<R>(read: &mut R) -> Result<Inbound, Error>
where
    R: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => {
                return Inbound::parse(text.as_str()).map_err(|e| Error::Deserialization {
                    message: e.to_string(),
                    body: text.to_string(),
                });
            }
            Some(Ok(Message::Close(_))) | None => {
                return Err(Error::WebSocketClosed {
                    reason: "closed during handshake".into(),
                });
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(Error::WebSocketConnect(e.to_string())),
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────────

async fn write_loop<W>(
    mut write: W,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    cancel: CancellationToken,
) where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                if let Err(e) = write.send(frame).await {
                    tracing::warn!(error = %e, "host websocket write failed");
                    cancel.cancel();
                    break;
                }
            }
        }
    }
    let _ = write.close().await;
    tracing::debug!("host websocket writer exiting");
}

async fn read_loop<R>(mut read: R, inner: Arc<Inner>, cancel: CancellationToken)
where
    R: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    let reason = loop {
        let frame = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            frame = read.next() => Some(frame),
        };
        match frame {
            None => break "connection shut down".to_owned(),
            Some(Some(Ok(Message::Text(text)))) => inner.dispatch(text.as_str()),
            Some(Some(Ok(Message::Close(frame)))) => {
                break frame.map_or_else(
                    || "close frame received".to_owned(),
                    |cf| format!("closed by host ({}): {}", cf.code, cf.reason),
                );
            }
            // tungstenite answers pings itself
            Some(Some(Ok(_))) => {}
            Some(Some(Err(e))) => break e.to_string(),
            Some(None) => break "stream ended".to_owned(),
        }
    };

    tracing::info!(reason = %reason, "host websocket closed");
    inner.fail_pending(&reason);
    cancel.cancel();
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::convert::Infallible;

    use futures_util::{sink, stream};

    use super::*;

    fn text(frame: &str) -> Result<Message, tungstenite::Error> {
        Ok(Message::Text(frame.to_owned().into()))
    }

    type Sent = Arc<Mutex<Vec<Message>>>;

    fn recording_sink() -> (impl Sink<Message, Error = Infallible> + Unpin, Sent) {
        let sent = Sent::default();
        let log = Arc::clone(&sent);
        let sink = Box::pin(sink::unfold((), move |(), frame: Message| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(frame);
                Ok::<_, Infallible>(())
            }
        }));
        (sink, sent)
    }

    fn porch_event(id: u64, state: &str) -> String {
        format!(
            r#"{{"id":{id},"type":"event","event":{{"event_type":"state_changed","data":{{"entity_id":"light.porch","new_state":{{"entity_id":"light.porch","state":"{state}","attributes":{{}}}}}}}}}}"#
        )
    }

    fn inner() -> (Arc<Inner>, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Inner::new(tx, Duration::from_secs(10))), rx)
    }

    #[tokio::test]
    async fn handshake_sends_token_and_accepts_auth_ok() {
        let mut read = stream::iter(vec![
            text(r#"{"type":"auth_required","ha_version":"2024.6.0"}"#),
            text(r#"{"type":"auth_ok","ha_version":"2024.6.0"}"#),
        ]);
        let (mut write, sent) = recording_sink();
        let token = SecretString::from("abc123".to_owned());

        authenticate(&mut write, &mut read, &token).await.unwrap();

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let frame: Value = serde_json::from_str(sent[0].to_text().unwrap()).unwrap();
        assert_eq!(frame["type"], "auth");
        assert_eq!(frame["access_token"], "abc123");
    }

    #[tokio::test]
    async fn handshake_maps_auth_invalid() {
        let mut read = stream::iter(vec![
            text(r#"{"type":"auth_required"}"#),
            text(r#"{"type":"auth_invalid","message":"Invalid access token"}"#),
        ]);
        let (mut write, _sent) = recording_sink();
        let err = authenticate(&mut write, &mut read, &SecretString::from("bad".to_owned()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Authentication { message } if message == "Invalid access token"));
    }

    #[tokio::test]
    async fn handshake_fails_when_stream_ends() {
        let mut read = stream::iter(Vec::<Result<Message, tungstenite::Error>>::new());
        let (mut write, _sent) = recording_sink();
        let err = authenticate(&mut write, &mut read, &SecretString::from("t".to_owned()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::WebSocketClosed { .. }));
    }

    #[tokio::test]
    async fn result_frames_resolve_pending_requests() {
        let (inner, _rx) = inner();
        let (ok_tx, ok_rx) = oneshot::channel();
        let (err_tx, err_rx) = oneshot::channel();
        inner.pending().insert(1, ok_tx);
        inner.pending().insert(2, err_tx);

        inner.dispatch(r#"{"id":1,"type":"result","success":true,"result":{"rooms":[]}}"#);
        inner.dispatch(
            r#"{"id":2,"type":"result","success":false,"error":{"code":"not_found","message":"gone"}}"#,
        );

        assert_eq!(ok_rx.await.unwrap().unwrap(), json!({ "rooms": [] }));
        let err = err_rx.await.unwrap().unwrap_err();
        assert!(err.is_not_found());
        assert!(inner.pending().is_empty());
    }

    #[test]
    fn events_update_snapshot_only_for_active_subscription() {
        let (inner, _rx) = inner();
        {
            let mut feed = inner.feed();
            feed.subscribe(5);
            feed.seed(Vec::new());
        }
        let mut snapshots = inner.feed().tx.subscribe();

        inner.dispatch(&porch_event(4, "on"));
        assert!(snapshots.borrow_and_update().is_empty());

        inner.dispatch(&porch_event(5, "off"));
        assert!(snapshots.has_changed().unwrap());
        assert_eq!(snapshots.borrow_and_update()["light.porch"].state, "off");
    }

    #[test]
    fn changes_before_seed_survive_the_seed() {
        let (inner, _rx) = inner();
        let mut snapshots = inner.feed().tx.subscribe();
        inner.feed().subscribe(1);

        inner.dispatch(&porch_event(1, "on"));
        assert!(!snapshots.has_changed().unwrap());

        let stale: HostState = serde_json::from_value(json!({
            "entity_id": "light.porch",
            "state": "off",
            "attributes": {}
        }))
        .unwrap();
        let other: HostState = serde_json::from_value(json!({
            "entity_id": "sensor.temp",
            "state": "21",
            "attributes": {}
        }))
        .unwrap();
        inner.feed().seed(vec![stale, other]);

        let snapshot = snapshots.borrow_and_update();
        assert_eq!(snapshot["light.porch"].state, "on");
        assert_eq!(snapshot["sensor.temp"].state, "21");
        drop(snapshot);

        inner.dispatch(&porch_event(1, "off"));
        assert_eq!(snapshots.borrow_and_update()["light.porch"].state, "off");
    }

    #[tokio::test]
    async fn closing_fails_outstanding_requests() {
        let (inner, _rx) = inner();
        let (tx, rx) = oneshot::channel();
        inner.pending().insert(9, tx);

        let cancel = CancellationToken::new();
        let read = stream::iter(vec![text(r#"{"type":"pong","id":3}"#)]);
        read_loop(read, Arc::clone(&inner), cancel.clone()).await;

        assert!(matches!(
            rx.await.unwrap(),
            Err(Error::WebSocketClosed { reason }) if reason == "stream ended"
        ));
        assert!(cancel.is_cancelled());
    }
}
