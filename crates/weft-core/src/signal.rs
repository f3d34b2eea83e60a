#![forbid(unsafe_code)]

//! Reactive value cells with synchronous change notification.
//!
//! - [`Signal`]: a shared value with get/set/update and ordered subscriber
//!   callbacks.
//! - [`Subscription`]: RAII handle; dropping it (or calling
//!   [`Subscription::unsubscribe`]) detaches the callback.
//! - [`Computed`]: a lazily evaluated value derived from other signals.
//! - [`Effect`]: a side effect that reruns when its dependencies change.
//! - [`batch`]: hold notifications back until a group of changes is done.
//!
//! # Architecture
//!
//! Signals are single-threaded (`Rc`/`RefCell`) and live entirely on the
//! dispatch loop's thread. The signal keeps only a `Weak` reference to each
//! callback; the strong reference lives in the [`Subscription`]. A notification
//! pass first upgrades every live callback into a snapshot and then invokes
//! the snapshot, so subscribing or unsubscribing from inside a callback never
//! disturbs the pass in progress.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in subscription order, exactly once per
//!    accepted change.
//! 2. A callback unsubscribed during a pass still receives that pass, but not
//!    the next one. A callback subscribed during a pass first hears the next one.
//! 3. With an equality policy, setting an equal value is a no-op: no version
//!    bump and no notification.
//! 4. A signal never re-enters its own notification. A `set` issued from one of
//!    its own callbacks stores the value immediately and schedules one more pass
//!    that runs after the current pass completes.
//! 5. The value is not borrowed while callbacks run, so callbacks may read it.
//! 6. Inside [`batch`], values change immediately but notification waits for
//!    the outermost batch to end. Each signal that changed is then notified
//!    once, in the order it first changed.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Callback = Rc<dyn Fn()>;
type EqualFn<T> = Box<dyn Fn(&T, &T) -> bool>;

thread_local! {
    static BATCH: RefCell<BatchState> = RefCell::new(BatchState::default());
}

#[derive(Default)]
struct BatchState {
    depth: usize,
    queued: Vec<Rc<Notifier>>,
}

fn batching() -> bool {
    BATCH.with(|state| state.borrow().depth > 0)
}

/// Run `f`, delaying change notifications until the outermost batch ends.
///
/// Values written inside the batch are visible immediately; only the
/// subscriber callbacks wait. A signal changed several times inside one
/// batch notifies once. If `f` panics, the queued notifications are dropped.
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use weft_core::signal::{batch, Signal, Subscribable};
///
/// let first = Signal::new("Ada".to_string());
/// let last = Signal::new("Byron".to_string());
/// let runs = Rc::new(Cell::new(0));
/// let r = Rc::clone(&runs);
/// let _sub = first.subscribe(move || r.set(r.get() + 1));
///
/// batch(|| {
///     first.set("Augusta".to_string());
///     first.set("Ada".to_string());
///     first.set("Augusta Ada".to_string());
///     last.set("King".to_string());
///     assert_eq!(runs.get(), 0);
/// });
/// assert_eq!(runs.get(), 1);
/// ```
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    BATCH.with(|state| state.borrow_mut().depth += 1);
    let guard = BatchGuard;
    let result = f();
    drop(guard);
    result
}

/// Closes one batch level and flushes when it was the outermost.
struct BatchGuard;

impl Drop for BatchGuard {
    fn drop(&mut self) {
        let flush = BATCH.with(|state| {
            let mut state = state.borrow_mut();
            state.depth = state.depth.saturating_sub(1);
            if state.depth == 0 {
                std::mem::take(&mut state.queued)
            } else {
                Vec::new()
            }
        });
        if std::thread::panicking() {
            return;
        }
        if !flush.is_empty() {
            crate::trace!(signals = flush.len(), "flushing batched notifications");
        }
        for notifier in flush {
            Notifier::notify(&notifier);
        }
    }
}

/// Ordered subscriber list with reentrancy-safe notification.
#[derive(Default)]
struct Notifier {
    callbacks: RefCell<Vec<Weak<dyn Fn()>>>,
    notifying: Cell<bool>,
    pending: Cell<bool>,
}

impl Notifier {
    fn subscribe(&self, callback: Callback) -> Subscription {
        self.callbacks.borrow_mut().push(Rc::downgrade(&callback));
        Subscription {
            callback: Some(callback),
        }
    }

    fn live_count(&self) -> usize {
        self.callbacks
            .borrow()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Upgrade live callbacks into a snapshot, pruning dead entries.
    fn snapshot(&self) -> Vec<Callback> {
        let mut callbacks = self.callbacks.borrow_mut();
        let mut live = Vec::with_capacity(callbacks.len());
        callbacks.retain(|weak| match weak.upgrade() {
            Some(cb) => {
                live.push(cb);
                true
            }
            None => false,
        });
        live
    }

    /// Notify subscribers now, or queue the pass if a batch is open.
    fn notify(this: &Rc<Self>) {
        let deferred = BATCH.with(|state| {
            let mut state = state.borrow_mut();
            if state.depth == 0 {
                return false;
            }
            if !state.queued.iter().any(|queued| Rc::ptr_eq(queued, this)) {
                state.queued.push(Rc::clone(this));
            }
            true
        });
        if deferred {
            return;
        }
        this.run_pass();
    }

    fn run_pass(&self) {
        if self.notifying.get() {
            self.pending.set(true);
            crate::trace!("signal notification deferred until current pass completes");
            return;
        }

        let _guard = NotifyGuard::enter(&self.notifying);
        loop {
            self.pending.set(false);
            for callback in self.snapshot() {
                callback();
            }
            if !self.pending.get() {
                break;
            }
        }
    }
}

/// Clears the notifying flag even if a callback unwinds.
struct NotifyGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> NotifyGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for NotifyGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Something that can report changes to subscribers.
pub trait Subscribable {
    /// Register a shared callback. The returned handle keeps it alive.
    fn subscribe_rc(&self, callback: Rc<dyn Fn()>) -> Subscription;

    /// Register a callback invoked with no arguments after every change.
    #[must_use = "dropping the subscription detaches the callback immediately"]
    fn subscribe(&self, callback: impl Fn() + 'static) -> Subscription
    where
        Self: Sized,
    {
        self.subscribe_rc(Rc::new(callback))
    }
}

/// Handle to a registered callback.
///
/// The callback stays attached for as long as the handle lives.
#[must_use = "dropping the subscription detaches the callback immediately"]
pub struct Subscription {
    callback: Option<Callback>,
}

impl Subscription {
    /// Detach the callback. Equivalent to dropping the handle.
    pub fn unsubscribe(mut self) {
        self.callback = None;
    }

    /// A handle that was never attached to anything.
    pub fn detached() -> Self {
        Self { callback: None }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.callback.is_some()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

struct SignalInner<T> {
    value: RefCell<T>,
    version: Cell<u64>,
    equal: Option<EqualFn<T>>,
    notifier: Rc<Notifier>,
}

/// A shared reactive value.
///
/// Cloning a `Signal` yields another handle to the same value.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: PartialEq + 'static> Signal<T> {
    /// Create a signal that ignores assignments of an equal value.
    pub fn new(value: T) -> Self {
        Self::with_equality(value, |a, b| a == b)
    }
}

impl<T: 'static> Signal<T> {
    /// Create a signal that notifies on every assignment, equal or not.
    pub fn always_notify(value: T) -> Self {
        Self::build(value, None)
    }

    /// Create a signal with a custom "unchanged" predicate.
    pub fn with_equality(value: T, equal: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Self::build(value, Some(Box::new(equal)))
    }

    fn build(value: T, equal: Option<EqualFn<T>>) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                equal,
                notifier: Rc::default(),
            }),
        }
    }

    /// A clone of the current value.
    #[must_use]
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Run `f` against a borrow of the current value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value. Returns true if it changed and subscribers ran.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.borrow_mut();
            if let Some(equal) = &self.inner.equal
                && equal(&current, &value)
            {
                return false;
            }
            *current = value;
        }
        self.inner.version.set(self.inner.version.get() + 1);
        Notifier::notify(&self.inner.notifier);
        true
    }

    /// Derive the next value from the current one and store it.
    ///
    /// Subject to the same equality policy as [`Signal::set`].
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let next = {
            let current = self.inner.value.borrow();
            f(&current)
        };
        self.set(next)
    }

    /// Number of accepted changes since creation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Number of attached callbacks.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.notifier.live_count()
    }
}

impl<T: 'static> Subscribable for Signal<T> {
    fn subscribe_rc(&self, callback: Rc<dyn Fn()>) -> Subscription {
        self.inner.notifier.subscribe(callback)
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("value", &self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

impl<T: Default + PartialEq + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

struct ComputedInner<T> {
    compute: Box<dyn Fn() -> T>,
    cache: RefCell<Option<T>>,
    dirty: Cell<bool>,
    notifier: Rc<Notifier>,
    _sources: RefCell<Vec<Subscription>>,
}

/// A memoized value derived from other signals.
///
/// The closure runs lazily on [`Computed::get`] after any source changed.
/// Subscribers of the computed value are notified whenever a source
/// notifies, before the value is recomputed.
pub struct Computed<T> {
    inner: Rc<ComputedInner<T>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Computed<T> {
    /// Derive a value from `sources` using `compute`.
    pub fn new(sources: &[&dyn Subscribable], compute: impl Fn() -> T + 'static) -> Self {
        let inner = Rc::new(ComputedInner {
            compute: Box::new(compute),
            cache: RefCell::new(None),
            dirty: Cell::new(true),
            notifier: Rc::default(),
            _sources: RefCell::new(Vec::with_capacity(sources.len())),
        });

        for source in sources {
            let weak = Rc::downgrade(&inner);
            let sub = source.subscribe_rc(Rc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.dirty.set(true);
                    Notifier::notify(&inner.notifier);
                }
            }));
            inner._sources.borrow_mut().push(sub);
        }

        Self { inner }
    }

    /// The current derived value, recomputed if a source changed.
    ///
    /// Inside a [`batch`] the sources have not notified yet, so the cache is
    /// bypassed.
    #[must_use]
    pub fn get(&self) -> T {
        if self.inner.dirty.get() || batching() || self.inner.cache.borrow().is_none() {
            let value = (self.inner.compute)();
            *self.inner.cache.borrow_mut() = Some(value.clone());
            self.inner.dirty.set(false);
            return value;
        }
        match &*self.inner.cache.borrow() {
            Some(value) => value.clone(),
            None => (self.inner.compute)(),
        }
    }

    /// Returns true if the next `get` will recompute.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }
}

impl<T: 'static> Subscribable for Computed<T> {
    fn subscribe_rc(&self, callback: Rc<dyn Fn()>) -> Subscription {
        self.inner.notifier.subscribe(callback)
    }
}

struct EffectInner {
    run: Box<dyn Fn()>,
    active: Cell<bool>,
    deps: RefCell<Vec<Subscription>>,
}

impl EffectInner {
    fn run(&self) {
        if self.active.get() {
            (self.run)();
        }
    }
}

/// A side effect bound to a set of dependencies.
///
/// The closure runs once on creation and again after every notification from
/// any dependency. Dropping the handle disposes the effect.
#[must_use = "dropping the effect disposes it immediately"]
pub struct Effect {
    inner: Rc<EffectInner>,
}

impl Effect {
    /// Create the effect and run it once.
    pub fn new(deps: &[&dyn Subscribable], run: impl Fn() + 'static) -> Self {
        let inner = Rc::new(EffectInner {
            run: Box::new(run),
            active: Cell::new(true),
            deps: RefCell::new(Vec::with_capacity(deps.len())),
        });
        for dep in deps {
            let weak = Rc::downgrade(&inner);
            let sub = dep.subscribe_rc(Rc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.run();
                }
            }));
            inner.deps.borrow_mut().push(sub);
        }
        inner.run();
        Self { inner }
    }

    /// Run the effect now, whether or not a dependency changed.
    pub fn trigger(&self) {
        self.inner.run();
    }

    /// Stop the effect and detach it from its dependencies. Idempotent.
    pub fn dispose(&self) {
        if !self.inner.active.replace(false) {
            return;
        }
        let deps = std::mem::take(&mut *self.inner.deps.borrow_mut());
        drop(deps);
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("active", &self.is_active())
            .field("deps", &self.inner.deps.borrow().len())
            .finish()
    }
}
