use futures::stream::{BoxStream, Stream};
use futures::StreamExt;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

type Start<Msg> = Box<dyn FnOnce() -> BoxStream<'static, Msg> + Send>;

/// A model-dependent set of live message streams.
///
/// Subscriptions are declared by the program's `subscriptions` function and
/// recomputed every time the model changes.  Nothing runs until the runtime
/// switches to the model that declared it: at that point every stream of the
/// previous model is dropped and every stream of the new one is started, so a
/// subscription always reflects the latest model, mapping closures included.
pub struct Subscription<Msg> {
    streams: Vec<Start<Msg>>,
}

impl<Msg> fmt::Debug for Subscription<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("streams", &self.streams.len())
            .finish()
    }
}

impl<Msg: Send + 'static> Subscription<Msg> {
    /// The empty subscription: subscribing to it never calls back.
    pub fn none() -> Self {
        Subscription {
            streams: Vec::new(),
        }
    }

    /// A subscription whose stream is built only when it is switched in.
    ///
    /// `start` runs once per switch, so resources it opens (timers, sockets,
    /// terminal readers) live exactly as long as the model that declared them.
    pub fn new<S>(start: impl FnOnce() -> S + Send + 'static) -> Self
    where
        S: Stream<Item = Msg> + Send + 'static,
    {
        Subscription {
            streams: vec![Box::new(move || start().boxed())],
        }
    }

    /// Subscribe to an already built stream.
    pub fn from_stream(stream: impl Stream<Item = Msg> + Send + 'static) -> Self {
        Subscription::new(move || stream)
    }

    /// Merge several subscriptions into one.
    pub fn batch(subs: impl IntoIterator<Item = Subscription<Msg>>) -> Self {
        Subscription {
            streams: subs.into_iter().flat_map(|sub| sub.streams).collect(),
        }
    }

    /// Transform the message type (for component composition).
    pub fn map<NewMsg: Send + 'static>(
        self,
        f: impl Fn(Msg) -> NewMsg + Send + Sync + 'static,
    ) -> Subscription<NewMsg> {
        let f = Arc::new(f);
        Subscription {
            streams: self
                .streams
                .into_iter()
                .map(|start| {
                    let f = Arc::clone(&f);
                    Box::new(move || start().map(move |msg| f(msg)).boxed()) as Start<NewMsg>
                })
                .collect(),
        }
    }

    /// Returns `true` if this subscription declares no streams.
    pub fn is_none(&self) -> bool {
        self.streams.is_empty()
    }

    /// Number of streams this subscription starts when switched in.
    pub fn len(&self) -> usize {
        self.streams.len()
    }
}

/// Computes the subscription set for a model.
pub type SubscriptionsFn<Model, Msg> = Arc<dyn Fn(&Model) -> Subscription<Msg> + Send + Sync>;

/// The `sub$` stream: switches the running subscription set on every model.
///
/// Models are drained before any subscription stream is polled, so once a
/// model has been observed no message from a stream it replaced is yielded.
/// The model stream is expected to be distinct already; each item it yields
/// restarts the whole set.
pub(crate) struct SubscriptionSwitch<Model, Msg> {
    models: BoxStream<'static, Model>,
    subscriptions: SubscriptionsFn<Model, Msg>,
    running: Vec<BoxStream<'static, Msg>>,
    models_done: bool,
}

impl<Model, Msg: Send + 'static> SubscriptionSwitch<Model, Msg> {
    pub(crate) fn new(
        models: BoxStream<'static, Model>,
        subscriptions: SubscriptionsFn<Model, Msg>,
    ) -> Self {
        Self {
            models,
            subscriptions,
            running: Vec::new(),
            models_done: false,
        }
    }

    // Old streams are dropped before the new ones start, so a source that
    // allows a single reader can be declared by consecutive models.
    fn switch_to(&mut self, next: Subscription<Msg>) {
        let stopped = self.running.len();
        self.running.clear();
        self.running.extend(next.streams.into_iter().map(|start| start()));

        if stopped > 0 || !self.running.is_empty() {
            tracing::trace!(stopped, started = self.running.len(), "subscriptions switched");
        }
    }

    #[cfg(test)]
    fn running_count(&self) -> usize {
        self.running.len()
    }
}

impl<Model, Msg: Send + 'static> Stream for SubscriptionSwitch<Model, Msg> {
    type Item = Msg;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Msg>> {
        let this = self.get_mut();

        while !this.models_done {
            match this.models.poll_next_unpin(cx) {
                Poll::Ready(Some(model)) => {
                    let next = (this.subscriptions)(&model);
                    this.switch_to(next);
                }
                Poll::Ready(None) => this.models_done = true,
                Poll::Pending => break,
            }
        }

        let mut idx = 0;
        while idx < this.running.len() {
            match this.running[idx].poll_next_unpin(cx) {
                Poll::Ready(Some(msg)) => {
                    // Move the producer to the back so its siblings get
                    // polled first next time.
                    let stream = this.running.remove(idx);
                    this.running.push(stream);
                    return Poll::Ready(Some(msg));
                }
                // Finished until a later model declares it again.
                Poll::Ready(None) => {
                    this.running.remove(idx);
                }
                Poll::Pending => idx += 1,
            }
        }

        if this.models_done && this.running.is_empty() {
            Poll::Ready(None)
        } else {
            Poll::Pending
        }
    }
}
