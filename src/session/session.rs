//! The session: local dispatch, get orchestration and the transport boundary

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};

use parking_lot::Mutex;

use crate::{
    buffers::Bytes,
    channels::{Callback, FifoChannel, IntoHandler},
    error::{RelayError, Result},
    key_expr::KeyExpr,
    query::{ConsolidationMode, PendingGet, QueryTimer},
    resource::{
        Clock, Query, QueryBody, Reply, Sample, SampleKind, Selector, SessionId, Timestamp,
    },
    transport::{
        Declaration, LocalTransport, PushMessage, RequestMessage, ResponseMessage, Transport,
    },
};

use super::{
    config::Config,
    liveliness::Liveliness,
    options::{GetOptions, PublisherOptions, PutOptions, QuerierOptions, QueryableOptions},
    publisher::Publisher,
    querier::Querier,
    queryable::Queryable,
    registry::{QueryableEntry, Registry, SubscriberEntry},
    sinks::{LocalReplySink, RemoteReplySink, RemoteRequest},
    stats::SessionStats,
    subscriber::Subscriber,
};

/// Convert anything key-like, keeping the caller's error
pub(crate) fn to_key_expr<K>(key_expr: K) -> Result<KeyExpr>
where
    K: TryInto<KeyExpr>,
    K::Error: Into<RelayError>,
{
    key_expr.try_into().map_err(Into::into)
}

pub(crate) struct SessionInner {
    pub zid: SessionId,
    pub config: Config,
    pub clock: Clock,
    pub transport: Arc<dyn Transport>,
    pub registry: Registry,
    pub stats: SessionStats,
    timer: Mutex<Option<QueryTimer>>,
    closed: AtomicBool,
    next_id: AtomicU64,
}

impl SessionInner {
    pub fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(RelayError::SessionClosed);
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn stamp(&self, sample: &mut Sample) {
        if self.config.timestamping {
            sample.set_timestamp_if_absent(|| self.clock.new_timestamp());
        }
    }

    pub fn stamp_reply(&self, reply: &mut Reply) {
        if let Ok(sample) = reply.result_mut() {
            self.stamp(sample);
        }
    }

    fn observe(&self, timestamp: Option<&Timestamp>) {
        if let Some(timestamp) = timestamp {
            self.clock.observe(timestamp);
        }
    }

    /// Announce a declaration, then register it locally. Nothing stays
    /// registered when either step fails.
    pub fn register(
        &self,
        declaration: &Declaration,
        insert: impl FnOnce(&Registry),
        rollback: impl FnOnce(&Registry),
    ) -> Result<()> {
        self.ensure_open()?;
        self.transport.declare(declaration)?;
        insert(&self.registry);
        if self.is_closed() {
            rollback(&self.registry);
            return Err(RelayError::SessionClosed);
        }
        SessionStats::record(&self.stats.declarations);
        log::debug!("declared {:?}", declaration);
        Ok(())
    }

    pub fn unregister(&self, declaration: &Declaration) {
        if self.is_closed() {
            return;
        }
        if let Err(err) = self.transport.undeclare(declaration) {
            log::warn!("transport failed to undeclare {:?}: {}", declaration, err);
        }
        SessionStats::record(&self.stats.undeclarations);
        log::debug!("undeclared {:?}", declaration);
    }

    pub fn publish(&self, mut sample: Sample) -> Result<()> {
        self.ensure_open()?;
        self.stamp(&mut sample);
        self.transport.push(PushMessage::from(&sample))?;
        SessionStats::record(&self.stats.publications);
        let subscribers = self.registry.matching_subscribers(sample.key_expr());
        self.deliver(&subscribers, sample);
        Ok(())
    }

    /// Hand one sample to each entry; the last one gets the original
    fn deliver(&self, entries: &[Arc<SubscriberEntry>], sample: Sample) {
        log::trace!("{} -> {} local subscribers", sample.key_expr(), entries.len());
        SessionStats::record_n(&self.stats.deliveries, entries.len());
        if let Some((last, rest)) = entries.split_last() {
            for entry in rest {
                entry.callback.call(sample.clone());
            }
            last.callback.call(sample);
        }
    }

    pub fn declare_subscriber(
        &self,
        key_expr: &KeyExpr,
        callback: Callback<Sample>,
    ) -> Result<u64> {
        let id = self.next_id();
        let declaration = Declaration::Subscriber {
            id,
            key_expr: key_expr.clone(),
        };
        let entry = SubscriberEntry {
            key_expr: key_expr.clone(),
            callback,
        };
        self.register(
            &declaration,
            |registry| registry.insert_subscriber(id, entry),
            |registry| close_subscriber(registry.remove_subscriber(id)),
        )?;
        Ok(id)
    }

    pub fn undeclare_subscriber(&self, id: u64, key_expr: &KeyExpr) {
        if let Some(entry) = self.registry.remove_subscriber(id) {
            entry.callback.close();
            self.unregister(&Declaration::Subscriber {
                id,
                key_expr: key_expr.clone(),
            });
        }
    }

    pub fn declare_queryable(
        &self,
        key_expr: &KeyExpr,
        callback: Callback<Query>,
        complete: bool,
    ) -> Result<u64> {
        let id = self.next_id();
        let declaration = Declaration::Queryable {
            id,
            key_expr: key_expr.clone(),
            complete,
        };
        let entry = QueryableEntry {
            key_expr: key_expr.clone(),
            complete,
            callback,
        };
        self.register(
            &declaration,
            |registry| registry.insert_queryable(id, entry),
            |registry| {
                if let Some(entry) = registry.remove_queryable(id) {
                    entry.callback.close();
                }
            },
        )?;
        Ok(id)
    }

    pub fn undeclare_queryable(&self, id: u64, key_expr: &KeyExpr, complete: bool) {
        if let Some(entry) = self.registry.remove_queryable(id) {
            entry.callback.close();
            self.unregister(&Declaration::Queryable {
                id,
                key_expr: key_expr.clone(),
                complete,
            });
        }
    }

    pub fn get(
        self: &Arc<Self>,
        selector: Selector,
        callback: Callback<Reply>,
        options: GetOptions,
    ) -> Result<()> {
        self.ensure_open()?;
        let id = self.next_id();
        let consolidation = options.consolidation.unwrap_or(self.config.consolidation);
        let timeout = if options.timeout.is_zero() {
            self.config.query_timeout
        } else {
            options.timeout
        };

        let get = Arc::new(PendingGet::new(id, consolidation, callback));
        self.registry.insert_get(get.clone());
        if self.is_closed() {
            self.abort_get(&get);
            return Err(RelayError::SessionClosed);
        }
        SessionStats::record(&self.stats.queries_sent);

        let request = RequestMessage {
            id,
            selector: selector.clone(),
            target: options.target,
            consolidation,
            timeout,
            payload: options.payload.clone(),
            encoding: options.encoding.clone(),
            attachment: options.attachment.clone(),
        };
        match self.transport.request(request) {
            Ok(remote) => get.add_responders(remote),
            Err(err) => {
                self.abort_get(&get);
                return Err(err);
            }
        }

        if let Some(deadline) = Instant::now().checked_add(timeout) {
            if let Some(timer) = self.timer.lock().as_ref() {
                timer.schedule(id, deadline);
            }
        }

        let queryables = self
            .registry
            .targeted_queryables(&selector.key_expr, options.target);
        get.add_responders(queryables.len());
        log::debug!(
            "get {} on {}: {} local queryables, {:?} consolidation",
            id,
            selector,
            queryables.len(),
            consolidation
        );

        let body = QueryBody {
            payload: options.payload,
            encoding: options.encoding,
            attachment: options.attachment,
        };
        for entry in queryables {
            let sink = LocalReplySink {
                session: Arc::downgrade(self),
                get: get.clone(),
                replier_id: self.zid,
            };
            SessionStats::record(&self.stats.queries_received);
            entry
                .callback
                .call(Query::new(selector.clone(), body.clone(), Box::new(sink)));
        }

        if get.dispatched() {
            self.registry.remove_get(id);
        }
        Ok(())
    }

    fn abort_get(&self, get: &PendingGet) {
        self.registry.remove_get(get.id());
        get.close();
    }

    pub fn expire_get(&self, id: u64) {
        if let Some(get) = self.registry.remove_get(id) {
            log::debug!("get {} timed out", id);
            get.close();
        }
    }

    pub fn declare_token(&self, key_expr: &KeyExpr) -> Result<u64> {
        let id = self.next_id();
        let declaration = Declaration::LivelinessToken {
            id,
            key_expr: key_expr.clone(),
        };
        let mut appeared = false;
        self.register(
            &declaration,
            |registry| appeared = registry.insert_token(id, key_expr.clone()),
            |registry| {
                registry.remove_token(id);
            },
        )?;
        if appeared {
            self.notify_liveliness(key_expr, true);
        }
        Ok(id)
    }

    pub fn undeclare_token(&self, id: u64) {
        if let Some((key_expr, vanished)) = self.registry.remove_token(id) {
            if vanished {
                self.notify_liveliness(&key_expr, false);
            }
            self.unregister(&Declaration::LivelinessToken { id, key_expr });
        }
    }

    pub fn declare_liveliness_subscriber(
        &self,
        key_expr: &KeyExpr,
        callback: Callback<Sample>,
        history: bool,
    ) -> Result<u64> {
        let id = self.next_id();
        let declaration = Declaration::LivelinessSubscriber {
            id,
            key_expr: key_expr.clone(),
        };
        let entry = SubscriberEntry {
            key_expr: key_expr.clone(),
            callback: callback.clone(),
        };
        self.register(
            &declaration,
            |registry| registry.insert_liveliness_subscriber(id, entry),
            |registry| close_subscriber(registry.remove_liveliness_subscriber(id)),
        )?;
        if history {
            for token in self.registry.alive_tokens(key_expr) {
                callback.call(self.liveliness_sample(token, true));
            }
        }
        Ok(id)
    }

    pub fn undeclare_liveliness_subscriber(&self, id: u64, key_expr: &KeyExpr) {
        if let Some(entry) = self.registry.remove_liveliness_subscriber(id) {
            entry.callback.close();
            self.unregister(&Declaration::LivelinessSubscriber {
                id,
                key_expr: key_expr.clone(),
            });
        }
    }

    pub fn liveliness_get(&self, key_expr: &KeyExpr, callback: Callback<Reply>) -> Result<()> {
        self.ensure_open()?;
        let get = PendingGet::new(self.next_id(), ConsolidationMode::None, callback);
        for token in self.registry.alive_tokens(key_expr) {
            let reply = Reply::ok(self.liveliness_sample(token, true)).with_replier_id(self.zid);
            get.on_reply(reply);
        }
        get.dispatched();
        Ok(())
    }

    fn liveliness_sample(&self, key_expr: KeyExpr, alive: bool) -> Sample {
        let mut sample = if alive {
            Sample::put(key_expr, Bytes::empty())
        } else {
            Sample::delete(key_expr)
        };
        self.stamp(&mut sample);
        sample
    }

    fn notify_liveliness(&self, key_expr: &KeyExpr, alive: bool) {
        let subscribers = self.registry.matching_liveliness_subscribers(key_expr);
        if !subscribers.is_empty() {
            let sample = self.liveliness_sample(key_expr.clone(), alive);
            self.deliver(&subscribers, sample);
        }
    }

    pub fn handle_push(&self, message: PushMessage) -> Result<()> {
        self.ensure_open()?;
        let sample = message.into_sample();
        self.observe(sample.timestamp());
        let subscribers = self.registry.matching_subscribers(sample.key_expr());
        self.deliver(&subscribers, sample);
        Ok(())
    }

    pub fn handle_request(self: &Arc<Self>, message: RequestMessage) -> Result<usize> {
        self.ensure_open()?;
        let queryables = self
            .registry
            .targeted_queryables(&message.selector.key_expr, message.target);
        log::trace!(
            "request {} on {} -> {} local queryables",
            message.id,
            message.selector,
            queryables.len()
        );

        // Dropped once every query built below is gone, which finalizes the
        // request towards the requester.
        let request = Arc::new(RemoteRequest {
            session: Arc::downgrade(self),
            request_id: message.id,
        });
        let body = QueryBody {
            payload: message.payload,
            encoding: message.encoding,
            attachment: message.attachment,
        };
        for entry in &queryables {
            let sink = RemoteReplySink {
                request: request.clone(),
            };
            SessionStats::record(&self.stats.queries_received);
            entry.callback.call(Query::new(
                message.selector.clone(),
                body.clone(),
                Box::new(sink),
            ));
        }
        Ok(queryables.len())
    }

    pub fn handle_response(&self, message: ResponseMessage) -> Result<()> {
        self.ensure_open()?;
        if let Ok(sample) = message.reply.result() {
            self.observe(sample.timestamp());
        }
        match self.registry.get(message.request_id) {
            Some(get) => {
                SessionStats::record(&self.stats.replies_received);
                get.on_reply(message.reply);
            }
            None => log::trace!("reply to unknown or finished get {}", message.request_id),
        }
        Ok(())
    }

    pub fn handle_response_final(&self, request_id: u64) -> Result<()> {
        self.ensure_open()?;
        if let Some(get) = self.registry.get(request_id) {
            if get.responder_done() {
                self.registry.remove_get(request_id);
            }
        }
        Ok(())
    }

    pub fn handle_liveliness(&self, key_expr: &KeyExpr, alive: bool) -> Result<()> {
        self.ensure_open()?;
        if self.registry.update_remote_token(key_expr, alive) {
            self.notify_liveliness(key_expr, alive);
        }
        Ok(())
    }

    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let timer = self.timer.lock().take();
        if let Some(timer) = timer {
            timer.shutdown();
        }

        let drained = self.registry.drain();
        log::debug!(
            "closing session {}: {} subscribers, {} queryables, {} gets, {} tokens",
            self.zid,
            drained.subscribers.len(),
            drained.queryables.len(),
            drained.gets.len(),
            drained.tokens.len()
        );
        for get in drained.gets {
            get.close();
        }
        for entry in drained.subscribers {
            entry.callback.close();
        }
        for entry in drained.queryables {
            entry.callback.close();
        }
        for (id, key_expr) in drained.tokens {
            if let Err(err) = self
                .transport
                .undeclare(&Declaration::LivelinessToken { id, key_expr })
            {
                log::warn!("transport failed to undeclare token {}: {}", id, err);
            }
        }
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.close();
    }
}

fn close_subscriber(entry: Option<Arc<SubscriberEntry>>) {
    if let Some(entry) = entry {
        entry.callback.close();
    }
}

/// Handle on an open session.
///
/// Clones share the session, which closes when the last clone is dropped or
/// on [`Session::close`]. Declared entities do not keep it open.
#[derive(Clone)]
pub struct Session {
    pub(crate) inner: Arc<SessionInner>,
}

impl Session {
    /// Open a session over `transport`
    pub fn open(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let zid = match config.id {
            Some(id) => SessionId::new(id)?,
            None => SessionId::rand(),
        };

        let inner = Arc::new(SessionInner {
            zid,
            clock: Clock::new(zid),
            transport,
            registry: Registry::default(),
            stats: SessionStats::new(),
            timer: Mutex::new(None),
            closed: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
            config,
        });

        let weak = Arc::downgrade(&inner);
        let timer = QueryTimer::start(move |get_id| {
            if let Some(session) = weak.upgrade() {
                session.expire_get(get_id);
            }
        })?;
        *inner.timer.lock() = Some(timer);

        log::debug!("session {} opened", zid);
        Ok(Self { inner })
    }

    /// Open a session without peers
    pub fn open_local(config: Config) -> Result<Self> {
        Self::open(config, Arc::new(LocalTransport))
    }

    pub fn zid(&self) -> SessionId {
        self.inner.zid
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn stats(&self) -> &SessionStats {
        &self.inner.stats
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Timestamp from the session clock
    pub fn new_timestamp(&self) -> Timestamp {
        self.inner.clock.new_timestamp()
    }

    /// Fifo channel with the configured capacity
    pub fn default_handler(&self) -> FifoChannel {
        FifoChannel::new(self.inner.config.channel_capacity)
    }

    /// Gets still waiting for replies
    pub fn pending_gets(&self) -> usize {
        self.inner.registry.pending_gets()
    }

    pub fn put<K>(&self, key_expr: K, payload: impl Into<Bytes>) -> Result<()>
    where
        K: TryInto<KeyExpr>,
        K::Error: Into<RelayError>,
    {
        self.put_with(key_expr, payload, PutOptions::default())
    }

    pub fn put_with<K>(&self, key_expr: K, payload: impl Into<Bytes>, options: PutOptions) -> Result<()>
    where
        K: TryInto<KeyExpr>,
        K::Error: Into<RelayError>,
    {
        let key_expr = to_key_expr(key_expr)?;
        let sample = options.into_sample(
            key_expr,
            SampleKind::Put,
            payload.into(),
            &PublisherOptions::default(),
        );
        self.inner.publish(sample)
    }

    pub fn delete<K>(&self, key_expr: K) -> Result<()>
    where
        K: TryInto<KeyExpr>,
        K::Error: Into<RelayError>,
    {
        self.delete_with(key_expr, PutOptions::default())
    }

    pub fn delete_with<K>(&self, key_expr: K, options: PutOptions) -> Result<()>
    where
        K: TryInto<KeyExpr>,
        K::Error: Into<RelayError>,
    {
        let key_expr = to_key_expr(key_expr)?;
        let sample = options.into_sample(
            key_expr,
            SampleKind::Delete,
            Bytes::empty(),
            &PublisherOptions::default(),
        );
        self.inner.publish(sample)
    }

    /// Query every matching queryable; replies arrive through `handler`,
    /// which is disconnected once the get is over
    pub fn get<S, H>(&self, selector: S, handler: H) -> Result<H::Handler>
    where
        S: TryInto<Selector>,
        S::Error: Into<RelayError>,
        H: IntoHandler<Reply>,
    {
        self.get_with(selector, handler, GetOptions::default())
    }

    pub fn get_with<S, H>(&self, selector: S, handler: H, options: GetOptions) -> Result<H::Handler>
    where
        S: TryInto<Selector>,
        S::Error: Into<RelayError>,
        H: IntoHandler<Reply>,
    {
        let selector: Selector = selector.try_into().map_err(Into::<RelayError>::into)?;
        let (callback, handler) = handler.into_handler();
        self.inner.get(selector, callback, options)?;
        Ok(handler)
    }

    pub fn declare_subscriber<K, H>(&self, key_expr: K, handler: H) -> Result<Subscriber<H::Handler>>
    where
        K: TryInto<KeyExpr>,
        K::Error: Into<RelayError>,
        H: IntoHandler<Sample>,
    {
        let key_expr = to_key_expr(key_expr)?;
        let (callback, handler) = handler.into_handler();
        let id = self.inner.declare_subscriber(&key_expr, callback)?;
        Ok(Subscriber::new(id, key_expr, false, &self.inner, handler))
    }

    pub fn declare_queryable<K, H>(&self, key_expr: K, handler: H) -> Result<Queryable<H::Handler>>
    where
        K: TryInto<KeyExpr>,
        K::Error: Into<RelayError>,
        H: IntoHandler<Query>,
    {
        self.declare_queryable_with(key_expr, handler, QueryableOptions::default())
    }

    pub fn declare_queryable_with<K, H>(
        &self,
        key_expr: K,
        handler: H,
        options: QueryableOptions,
    ) -> Result<Queryable<H::Handler>>
    where
        K: TryInto<KeyExpr>,
        K::Error: Into<RelayError>,
        H: IntoHandler<Query>,
    {
        let key_expr = to_key_expr(key_expr)?;
        let (callback, handler) = handler.into_handler();
        let id = self
            .inner
            .declare_queryable(&key_expr, callback, options.complete)?;
        Ok(Queryable::new(id, key_expr, options.complete, &self.inner, handler))
    }

    pub fn declare_publisher<K>(&self, key_expr: K) -> Result<Publisher>
    where
        K: TryInto<KeyExpr>,
        K::Error: Into<RelayError>,
    {
        self.declare_publisher_with(key_expr, PublisherOptions::default())
    }

    pub fn declare_publisher_with<K>(&self, key_expr: K, options: PublisherOptions) -> Result<Publisher>
    where
        K: TryInto<KeyExpr>,
        K::Error: Into<RelayError>,
    {
        let key_expr = to_key_expr(key_expr)?;
        Publisher::declare(&self.inner, key_expr, options)
    }

    pub fn declare_querier<K>(&self, key_expr: K) -> Result<Querier>
    where
        K: TryInto<KeyExpr>,
        K::Error: Into<RelayError>,
    {
        self.declare_querier_with(key_expr, QuerierOptions::default())
    }

    pub fn declare_querier_with<K>(&self, key_expr: K, options: QuerierOptions) -> Result<Querier>
    where
        K: TryInto<KeyExpr>,
        K::Error: Into<RelayError>,
    {
        let key_expr = to_key_expr(key_expr)?;
        Querier::declare(&self.inner, key_expr, options)
    }

    pub fn liveliness(&self) -> Liveliness<'_> {
        Liveliness::new(self)
    }

    /// Tear down every declaration and pending get. Idempotent.
    pub fn close(&self) -> Result<()> {
        self.inner.close();
        Ok(())
    }

    /// Deliver a publication received from the network
    pub fn handle_push(&self, message: PushMessage) -> Result<()> {
        self.inner.handle_push(message)
    }

    /// Run a remote query against local queryables; returns how many got it
    pub fn handle_request(&self, message: RequestMessage) -> Result<usize> {
        self.inner.handle_request(message)
    }

    /// Route a reply to the local get it answers
    pub fn handle_response(&self, message: ResponseMessage) -> Result<()> {
        self.inner.handle_response(message)
    }

    /// One remote responder finished answering a local get
    pub fn handle_response_final(&self, request_id: u64) -> Result<()> {
        self.inner.handle_response_final(request_id)
    }

    /// A remote liveliness token appeared or disappeared
    pub fn handle_liveliness(&self, key_expr: &KeyExpr, alive: bool) -> Result<()> {
        self.inner.handle_liveliness(key_expr, alive)
    }

    /// The network link is gone: everything is torn down as on close
    pub fn handle_link_lost(&self) {
        log::warn!("session {}: link lost, closing", self.inner.zid);
        self.inner.close();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("zid", &self.inner.zid)
            .field("closed", &self.inner.is_closed())
            .field("transport", &self.inner.transport)
            .finish()
    }
}
