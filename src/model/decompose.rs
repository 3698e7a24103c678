//! Decomposition engine.
//!
//! The [`Decomposer`] builds parts: it picks the one constructor matching
//! the request shape, runs it, populates every [`Slot`](super::Slot) field
//! depth-first and wraps the result into an [`Intercepted`]. A caller that
//! receives a part therefore receives its whole sub-tree, materialized and
//! individually intercepted.

// ============================================================================
// Imports
// ============================================================================

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::surface::{FramePath, Handle, Locator};

use super::intercept::{Intercepted, InterceptorChain};
use super::part::{Constructor, Part, Scope, Shape};

// ============================================================================
// Decomposer
// ============================================================================

struct DecomposerInner {
    registry: Registry,
    chain: InterceptorChain,
}

/// Builds intercepted parts for one registry.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct Decomposer {
    inner: Arc<DecomposerInner>,
}

impl fmt::Debug for Decomposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decomposer")
            .field("registry", &self.inner.registry)
            .field("chain", &self.inner.chain)
            .finish()
    }
}

impl Decomposer {
    /// Creates a decomposer wrapping every part with `chain`.
    #[must_use]
    pub fn new(registry: Registry, chain: InterceptorChain) -> Self {
        Self {
            inner: Arc::new(DecomposerInner { registry, chain }),
        }
    }

    /// Registry used to reach other surfaces.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Interceptors applied to every built part.
    #[inline]
    #[must_use]
    pub fn chain(&self) -> &InterceptorChain {
        &self.inner.chain
    }

    /// Builds a top-level part bound to `handle`.
    pub async fn root<P: Part>(&self, handle: Handle) -> Result<Intercepted<P>> {
        self.part(&Scope::new(handle), None, None).await
    }

    /// Builds part `P` inside `owner`.
    ///
    /// `frames` is relative to the owner's frames; when `frames` or
    /// `locator` is `None` the part's [`Descriptor`](super::Descriptor)
    /// default is used. The request shape is taken after defaults apply.
    ///
    /// # Errors
    ///
    /// - [`Error::FrameNotFound`] if the combined frame path does not resolve
    /// - [`Error::AmbiguousOrMissingConstructor`] unless exactly one
    ///   constructor accepts the shape
    /// - any error of the constructor or of a nested part
    pub async fn part<P: Part>(
        &self,
        owner: &Scope,
        frames: Option<FramePath>,
        locator: Option<Locator>,
    ) -> Result<Intercepted<P>> {
        let descriptor = P::descriptor();
        let frames = frames.or(descriptor.frames);
        let locator = locator.or(descriptor.locator);
        let shape = Shape::of(frames.is_some(), locator.is_some());

        let scope = owner.child(frames.as_ref(), locator);
        if frames.as_ref().is_some_and(|f| !f.is_empty()) {
            scope.handle().verify_frames(scope.frames()).await?;
        }

        let constructor = Self::select::<P>(shape)?;
        let mut raw = constructor.build(scope.clone())?;
        trace!(part = type_name::<P>(), %shape, frames = %scope.frames(), "Part constructed");

        self.populate(&mut raw, &scope).await?;

        debug!(part = type_name::<P>(), surface = %scope.handle().surface(), "Part ready");
        Ok(Intercepted::wrap(raw, scope, self.clone()))
    }

    fn select<P: Part>(shape: Shape) -> Result<Constructor<P>> {
        let mut matching: Vec<_> = P::constructors()
            .into_iter()
            .filter(|c| c.shape() == shape)
            .collect();

        let candidates = matching.len();
        match matching.pop() {
            Some(constructor) if candidates == 1 => Ok(constructor),
            _ => Err(Error::ambiguous_or_missing_constructor(
                type_name::<P>(),
                shape.to_string(),
                candidates,
            )),
        }
    }

    /// Fills every slot of `raw`, depth-first, in declaration order.
    async fn populate<P: Part>(&self, raw: &mut P, scope: &Scope) -> Result<()> {
        for mut field in raw.fields() {
            trace!(part = type_name::<P>(), field = field.name(), "Populating field");
            field.slot().fill(self, scope).await?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::driver::{Capabilities, DriverKind, DriverSession, MemoryConnector, MemoryDriver};
    use crate::model::part::{Descriptor, Field, Slot};

    struct Banner {
        scope: Scope,
    }

    impl Part for Banner {
        fn constructors() -> Vec<Constructor<Self>> {
            vec![
                Constructor::handle(|scope| Ok(Banner { scope })),
                Constructor::handle_locator(|scope| Ok(Banner { scope })),
            ]
        }
    }

    struct Editor {
        scope: Scope,
        toolbar: Slot<Banner>,
    }

    impl Part for Editor {
        fn constructors() -> Vec<Constructor<Self>> {
            vec![Constructor::handle_frames(|scope| {
                Ok(Editor {
                    scope,
                    toolbar: Slot::new().with_locator(Locator::id("toolbar")),
                })
            })]
        }

        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![Field::new("toolbar", &mut self.toolbar)]
        }

        fn descriptor() -> Descriptor {
            Descriptor::default().with_frames(FramePath::new().name("editor"))
        }
    }

    struct Page {
        header: Slot<Banner>,
        editor: Slot<Editor>,
    }

    impl Part for Page {
        fn constructors() -> Vec<Constructor<Self>> {
            vec![Constructor::handle(|_| {
                Ok(Page {
                    header: Slot::new(),
                    editor: Slot::new(),
                })
            })]
        }

        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![
                Field::new("header", &mut self.header),
                Field::new("editor", &mut self.editor),
            ]
        }
    }

    struct Twice;

    impl Part for Twice {
        fn constructors() -> Vec<Constructor<Self>> {
            vec![
                Constructor::handle(|_| Ok(Twice)),
                Constructor::handle(|_| Ok(Twice)),
            ]
        }
    }

    async fn setup(driver: &MemoryDriver) -> (Decomposer, Handle) {
        let session = DriverSession::open(
            &MemoryConnector::new(driver.clone()),
            DriverKind::Firefox,
            Capabilities::new(),
            None,
        )
        .await
        .expect("session");
        let registry = Registry::new(session).expect("registry");
        let handle = registry.get_handle(0).await.expect("handle");
        (Decomposer::new(registry, InterceptorChain::empty()), handle)
    }

    #[tokio::test]
    async fn test_populates_depth_first() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "Doc", "https://doc/");
        driver.add_frame("w-1", &FramePath::new(), "editor", None);
        let (decomposer, handle) = setup(&driver).await;

        let page: Intercepted<Page> = decomposer.root(handle).await.unwrap();

        let header = page.field(|p| &p.header).unwrap();
        assert!(header.scope().frames().is_empty());

        let editor = page.field(|p| &p.editor).unwrap();
        assert_eq!(editor.scope().frames(), &FramePath::new().name("editor"));

        let toolbar = editor.field(|e| &e.toolbar).unwrap();
        assert_eq!(toolbar.scope().frames(), &FramePath::new().name("editor"));
        assert_eq!(toolbar.scope().locator(), Some(&Locator::id("toolbar")));
    }

    #[tokio::test]
    async fn test_missing_frame_fails_construction() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "Doc", "https://doc/");
        let (decomposer, handle) = setup(&driver).await;

        let err = decomposer.root::<Page>(handle).await.unwrap_err();
        assert!(matches!(err, Error::FrameNotFound { .. }));
    }

    #[tokio::test]
    async fn test_ambiguous_constructor() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "Doc", "https://doc/");
        let (decomposer, handle) = setup(&driver).await;

        let err = decomposer.root::<Twice>(handle).await.unwrap_err();
        assert!(matches!(
            err,
            Error::AmbiguousOrMissingConstructor { candidates: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_constructor_for_shape() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "Doc", "https://doc/");
        let (decomposer, handle) = setup(&driver).await;
        let scope = Scope::new(handle);

        let err = decomposer
            .part::<Banner>(&scope, Some(FramePath::new()), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::AmbiguousOrMissingConstructor { candidates: 0, .. }
        ));
    }

    #[tokio::test]
    async fn test_child_scope_inherits_handle() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "Doc", "https://doc/");
        let (decomposer, handle) = setup(&driver).await;

        let banner = decomposer
            .part::<Banner>(&Scope::new(handle.clone()), None, Some(Locator::css(".banner")))
            .await
            .unwrap();
        assert!(banner.handle().same_handle(&handle));
        let locator = banner
            .invoke("locator", async |b: &Banner| Ok(b.scope.locator().cloned()))
            .await
            .unwrap();
        assert_eq!(locator, Some(Locator::css(".banner")));
    }
}
