//! Interception layer.
//!
//! Every application or part handed to a caller is an [`Intercepted<T>`]:
//! it owns the raw value and runs an [`InterceptorChain`] around every call
//! made through [`Intercepted::invoke`]. There is no way to borrow the raw
//! value outside an invocation, so cross-cutting behavior cannot be
//! bypassed.
//!
//! # Call sequence
//!
//! 1. `before` hooks run in chain order; an error skips the call
//! 2. the call runs
//! 3. `after` hooks run in reverse order over the outcome; any hook may
//!    replace the value, translate the error or ask for a reissue
//! 4. on [`Flow::Reissue`] the whole sequence starts over with the attempt
//!    counter incremented
//!
//! # Example
//!
//! ```ignore
//! let title = app
//!     .invoke("title", async |app: &Shop| app.title().await)
//!     .await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::trace;

use crate::error::{Error, Result};
use crate::registry::HandleQuery;
use crate::surface::{FramePath, Handle, Locator};

use super::decompose::Decomposer;
use super::part::{Part, Scope, Slot};

// ============================================================================
// Outcome & Flow
// ============================================================================

/// Type-erased result of an intercepted call.
pub type Outcome = Result<Box<dyn Any + Send>>;

/// What an `after` hook wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep the outcome.
    Continue,
    /// Run the call again.
    Reissue,
}

// ============================================================================
// Invocation
// ============================================================================

/// Description of one intercepted call, shared by every hook.
#[derive(Debug, Clone)]
pub struct Invocation {
    part: &'static str,
    method: &'static str,
    attempt: u32,
    started: Instant,
    handle: Option<Handle>,
}

impl Invocation {
    pub(crate) fn new(part: &'static str, method: &'static str, handle: Option<Handle>) -> Self {
        Self {
            part,
            method,
            attempt: 1,
            started: Instant::now(),
            handle,
        }
    }

    fn next_attempt(&self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self.clone()
        }
    }

    /// Type name of the intercepted value.
    #[inline]
    #[must_use]
    pub fn part(&self) -> &'static str {
        self.part
    }

    /// Method name given to [`Intercepted::invoke`].
    #[inline]
    #[must_use]
    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Attempt number, starting at 1.
    #[inline]
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Time since the first attempt started.
    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Handle the intercepted value is bound to.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> Option<&Handle> {
        self.handle.as_ref()
    }
}

// ============================================================================
// Interceptor
// ============================================================================

/// Behavior wrapped around every call of an intercepted value.
///
/// An interceptor that returns [`Flow::Reissue`] is responsible for
/// bounding the number of attempts, see [`Invocation::attempt`].
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Runs before the call. An error aborts the call.
    async fn before(&self, _invocation: &Invocation) -> Result<()> {
        Ok(())
    }

    /// Runs after the call, in reverse chain order.
    async fn after(&self, _invocation: &Invocation, _outcome: &mut Outcome) -> Flow {
        Flow::Continue
    }
}

// ============================================================================
// InterceptorChain
// ============================================================================

/// Immutable ordered list of interceptors.
///
/// Built once with [`InterceptorChain::builder`]; values wrapped with a
/// chain keep it for their whole life.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Arc<[Arc<dyn Interceptor>]>,
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl InterceptorChain {
    /// Chain without interceptors.
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Starts a chain.
    #[inline]
    #[must_use]
    pub fn builder() -> ChainBuilder {
        ChainBuilder::default()
    }

    /// Interceptor names in chain order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    /// Number of interceptors.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Returns `true` if the chain is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Runs `call` through the chain.
    pub(crate) async fn run<R, F>(&self, invocation: Invocation, call: F) -> Result<R>
    where
        F: AsyncFn() -> Result<R>,
        R: Send + 'static,
    {
        let method = invocation.method();
        let mut invocation = invocation;

        loop {
            let mut ran = 0;
            let mut aborted = None;

            for interceptor in self.interceptors.iter() {
                if let Err(e) = interceptor.before(&invocation).await {
                    trace!(interceptor = interceptor.name(), method, error = %e, "Call aborted in before hook");
                    aborted = Some(e);
                    break;
                }
                ran += 1;
            }

            let mut outcome: Outcome = match aborted {
                Some(e) => Err(e),
                None => call().await.map(|value| Box::new(value) as Box<dyn Any + Send>),
            };

            let mut reissue = false;
            for interceptor in self.interceptors[..ran].iter().rev() {
                if interceptor.after(&invocation, &mut outcome).await == Flow::Reissue {
                    reissue = true;
                }
            }

            if reissue {
                trace!(method, attempt = invocation.attempt(), "Reissuing call");
                invocation = invocation.next_attempt();
                continue;
            }

            return match outcome {
                Ok(value) => value.downcast::<R>().map(|v| *v).map_err(|_| {
                    Error::intercept(method, format!("value replaced with a type other than {}", type_name::<R>()))
                }),
                Err(e) => Err(e),
            };
        }
    }
}

/// Builder for [`InterceptorChain`].
#[derive(Default)]
pub struct ChainBuilder {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl fmt::Debug for ChainBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainBuilder")
            .field("len", &self.interceptors.len())
            .finish()
    }
}

impl ChainBuilder {
    /// Appends an interceptor.
    #[must_use]
    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Appends a shared interceptor.
    #[must_use]
    pub fn with_shared(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Freezes the chain.
    #[must_use]
    pub fn build(self) -> InterceptorChain {
        InterceptorChain {
            interceptors: self.interceptors.into(),
        }
    }
}

// ============================================================================
// Intercepted
// ============================================================================

struct InterceptedInner<T> {
    target: T,
    scope: Scope,
    decomposer: Decomposer,
}

/// A part or application behind its interceptor chain.
///
/// Cheap to clone; clones share the raw value.
pub struct Intercepted<T> {
    inner: Arc<InterceptedInner<T>>,
}

impl<T> Clone for Intercepted<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Intercepted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Intercepted")
            .field("part", &type_name::<T>())
            .field("scope", &self.inner.scope)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Intercepted - Constructors & Accessors
// ============================================================================

impl<T: Part> Intercepted<T> {
    pub(crate) fn wrap(target: T, scope: Scope, decomposer: Decomposer) -> Self {
        Self {
            inner: Arc::new(InterceptedInner {
                target,
                scope,
                decomposer,
            }),
        }
    }

    /// Scope the value is bound to.
    #[inline]
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.inner.scope
    }

    /// Handle the value is bound to.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> &Handle {
        self.inner.scope.handle()
    }

    /// Interceptors applied to every call.
    #[inline]
    #[must_use]
    pub fn chain(&self) -> &InterceptorChain {
        self.inner.decomposer.chain()
    }

    /// Decomposer that built this value.
    #[inline]
    #[must_use]
    pub fn decomposer(&self) -> &Decomposer {
        &self.inner.decomposer
    }
}

// ============================================================================
// Intercepted - Calls
// ============================================================================

impl<T: Part> Intercepted<T> {
    /// Calls `f` on the raw value through the interceptor chain.
    ///
    /// `method` names the call in logs and in [`Invocation::method`].
    ///
    /// # Errors
    ///
    /// - any error of `f` that no interceptor recovered from
    /// - [`Error::Intercept`] if an interceptor replaced the value with
    ///   one of a different type
    pub async fn invoke<R, F>(&self, method: &'static str, f: F) -> Result<R>
    where
        F: AsyncFn(&T) -> Result<R>,
        R: Send + 'static,
    {
        let invocation = Invocation::new(type_name::<T>(), method, Some(self.handle().clone()));
        let target = &self.inner.target;
        self.chain().run(invocation, async || f(target).await).await
    }

    /// Returns the populated child held in a [`Slot`] field.
    ///
    /// The child is itself intercepted; no raw reference escapes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PartResolution`] if the slot is empty.
    pub fn field<C: Part>(&self, select: impl FnOnce(&T) -> &Slot<C>) -> Result<Intercepted<C>> {
        select(&self.inner.target).get().cloned()
    }
}

// ============================================================================
// Intercepted - Decomposition
// ============================================================================

impl<T: Part> Intercepted<T> {
    /// Builds a child part in this value's scope.
    pub async fn part<C: Part>(&self) -> Result<Intercepted<C>> {
        self.inner.decomposer.part(self.scope(), None, None).await
    }

    /// Builds a child part inside `frames`, relative to this scope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameNotFound`] if the path does not resolve.
    pub async fn part_in<C: Part>(&self, frames: FramePath) -> Result<Intercepted<C>> {
        self.inner.decomposer.part(self.scope(), Some(frames), None).await
    }

    /// Builds a child part rooted at `locator`.
    pub async fn part_at<C: Part>(&self, locator: Locator) -> Result<Intercepted<C>> {
        self.inner.decomposer.part(self.scope(), None, Some(locator)).await
    }

    /// Builds a child part inside `frames` rooted at `locator`.
    pub async fn part_in_at<C: Part>(&self, frames: FramePath, locator: Locator) -> Result<Intercepted<C>> {
        self.inner
            .decomposer
            .part(self.scope(), Some(frames), Some(locator))
            .await
    }

    /// Builds a part bound to another surface of the same session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if no surface matches in time.
    pub async fn part_on<C: Part>(&self, query: &HandleQuery, timeout: Duration) -> Result<Intercepted<C>> {
        let handle = self.inner.decomposer.registry().find(query, timeout).await?;
        self.inner.decomposer.root(handle).await
    }

    /// Destroys the driver session this value lives in.
    pub async fn quit(&self) {
        self.handle().session().destroy().await;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    use parking_lot::Mutex;

    struct Record {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Interceptor for Record {
        fn name(&self) -> &str {
            self.name
        }

        async fn before(&self, _invocation: &Invocation) -> Result<()> {
            self.log.lock().push(format!("before {}", self.name));
            Ok(())
        }

        async fn after(&self, _invocation: &Invocation, _outcome: &mut Outcome) -> Flow {
            self.log.lock().push(format!("after {}", self.name));
            Flow::Continue
        }
    }

    struct Replace;

    #[async_trait]
    impl Interceptor for Replace {
        fn name(&self) -> &str {
            "replace"
        }

        async fn after(&self, _invocation: &Invocation, outcome: &mut Outcome) -> Flow {
            *outcome = Ok(Box::new("replaced"));
            Flow::Continue
        }
    }

    struct ReissueTwice;

    #[async_trait]
    impl Interceptor for ReissueTwice {
        fn name(&self) -> &str {
            "reissue"
        }

        async fn after(&self, invocation: &Invocation, outcome: &mut Outcome) -> Flow {
            if outcome.is_err() && invocation.attempt() < 3 {
                Flow::Reissue
            } else {
                Flow::Continue
            }
        }
    }

    struct Deny;

    #[async_trait]
    impl Interceptor for Deny {
        fn name(&self) -> &str {
            "deny"
        }

        async fn before(&self, _invocation: &Invocation) -> Result<()> {
            Err(Error::remote("denied"))
        }
    }

    fn invocation() -> Invocation {
        Invocation::new("Test", "call", None)
    }

    #[tokio::test]
    async fn test_hooks_run_in_onion_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = InterceptorChain::builder()
            .with(Record { name: "a", log: Arc::clone(&log) })
            .with(Record { name: "b", log: Arc::clone(&log) })
            .build();

        let call_log = Arc::clone(&log);
        let value = chain
            .run(invocation(), async || {
                call_log.lock().push("call".to_string());
                Ok(7)
            })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(
            *log.lock(),
            vec!["before a", "before b", "call", "after b", "after a"]
        );
    }

    #[tokio::test]
    async fn test_after_may_replace_value() {
        let chain = InterceptorChain::builder().with(Replace).build();
        let value: &str = chain
            .run(invocation(), async || Ok("original"))
            .await
            .unwrap();
        assert_eq!(value, "replaced");
    }

    #[tokio::test]
    async fn test_replacing_with_wrong_type_is_reported() {
        let chain = InterceptorChain::builder().with(Replace).build();
        let err = chain.run(invocation(), async || Ok(1_u8)).await.unwrap_err();
        assert!(matches!(err, Error::Intercept { method: "call", .. }));
    }

    #[tokio::test]
    async fn test_reissue_repeats_call() {
        let calls = AtomicU32::new(0);
        let chain = InterceptorChain::builder().with(ReissueTwice).build();

        let value = chain
            .run(invocation(), async || {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::stale_element("e-1"))
                } else {
                    Ok("done")
                }
            })
            .await
            .unwrap();

        assert_eq!(value, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_before_error_skips_call_and_later_hooks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let called = AtomicU32::new(0);
        let chain = InterceptorChain::builder()
            .with(Record { name: "outer", log: Arc::clone(&log) })
            .with(Deny)
            .with(Record { name: "inner", log: Arc::clone(&log) })
            .build();

        let err = chain
            .run(invocation(), async || {
                called.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Remote { .. }));
        assert_eq!(called.load(Ordering::SeqCst), 0);
        assert_eq!(*log.lock(), vec!["before outer", "after outer"]);
    }

    #[test]
    fn test_chain_names() {
        let chain = InterceptorChain::builder().with(Replace).with(Deny).build();
        assert_eq!(chain.names(), vec!["replace", "deny"]);
        assert_eq!(chain.len(), 2);
        assert!(InterceptorChain::empty().is_empty());
    }

    #[test]
    fn test_intercepted_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<Intercepted<()>>();
    }
}
