//! Decomposable parts.
//!
//! A [`Part`] is a UI fragment bound to a [`Scope`]: a handle, a frame path
//! inside it and an optional root locator. A part describes itself with
//! plain data:
//!
//! - [`Part::constructors`] lists typed factories, each tagged with the
//!   [`Shape`] of arguments it accepts
//! - [`Part::fields`] exposes the [`Slot`] fields holding nested parts
//! - [`Part::descriptor`] gives default frames and locator
//!
//! # Example
//!
//! ```ignore
//! struct Login {
//!     scope: Scope,
//! }
//!
//! struct Shop {
//!     scope: Scope,
//!     login: Slot<Login>,
//! }
//!
//! impl Part for Shop {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![Constructor::handle(|scope| Ok(Shop {
//!             scope,
//!             login: Slot::new().with_locator(Locator::id("login")),
//!         }))]
//!     }
//!
//!     fn fields(&mut self) -> Vec<Field<'_>> {
//!         vec![Field::new("login", &mut self.login)]
//!     }
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::any::type_name;
use std::fmt;

use futures_util::future::BoxFuture;

use crate::error::{Error, Result};
use crate::identifiers::ElementId;
use crate::surface::{FramePath, Handle, Locator};

use super::decompose::Decomposer;
use super::intercept::Intercepted;

// ============================================================================
// Part
// ============================================================================

/// A UI fragment that can be built by the [`Decomposer`].
pub trait Part: Sized + Send + Sync + 'static {
    /// Factories for this part. Exactly one must match each requested shape.
    fn constructors() -> Vec<Constructor<Self>>;

    /// Nested part fields, populated depth-first after construction.
    fn fields(&mut self) -> Vec<Field<'_>> {
        Vec::new()
    }

    /// Defaults used when the caller gives no frames or locator.
    fn descriptor() -> Descriptor {
        Descriptor::default()
    }
}

/// Default placement of a part type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptor {
    /// Frame path relative to the owner.
    pub frames: Option<FramePath>,
    /// Root element locator.
    pub locator: Option<Locator>,
}

impl Descriptor {
    /// Sets the default frame path.
    #[must_use]
    pub fn with_frames(mut self, frames: FramePath) -> Self {
        self.frames = Some(frames);
        self
    }

    /// Sets the default root locator.
    #[must_use]
    pub fn with_locator(mut self, locator: impl Into<Locator>) -> Self {
        self.locator = Some(locator.into());
        self
    }
}

// ============================================================================
// Shape & Constructor
// ============================================================================

/// Argument shape a constructor accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// `(handle)`
    Handle,
    /// `(handle, frames)`
    HandleFrames,
    /// `(handle, locator)`
    HandleLocator,
    /// `(handle, frames, locator)`
    HandleFramesLocator,
}

impl Shape {
    /// Shape of a request carrying the given optional arguments.
    #[must_use]
    pub const fn of(frames: bool, locator: bool) -> Self {
        match (frames, locator) {
            (false, false) => Self::Handle,
            (true, false) => Self::HandleFrames,
            (false, true) => Self::HandleLocator,
            (true, true) => Self::HandleFramesLocator,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Handle => "(handle)",
            Self::HandleFrames => "(handle, frames)",
            Self::HandleLocator => "(handle, locator)",
            Self::HandleFramesLocator => "(handle, frames, locator)",
        })
    }
}

/// Typed factory for a part.
pub struct Constructor<P> {
    shape: Shape,
    build: fn(Scope) -> Result<P>,
}

impl<P> fmt::Debug for Constructor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("part", &type_name::<P>())
            .field("shape", &self.shape)
            .finish()
    }
}

impl<P> Constructor<P> {
    /// Creates a constructor for `shape`.
    #[must_use]
    pub const fn new(shape: Shape, build: fn(Scope) -> Result<P>) -> Self {
        Self { shape, build }
    }

    /// Constructor taking only the handle.
    #[must_use]
    pub const fn handle(build: fn(Scope) -> Result<P>) -> Self {
        Self::new(Shape::Handle, build)
    }

    /// Constructor taking handle and frames.
    #[must_use]
    pub const fn handle_frames(build: fn(Scope) -> Result<P>) -> Self {
        Self::new(Shape::HandleFrames, build)
    }

    /// Constructor taking handle and locator.
    #[must_use]
    pub const fn handle_locator(build: fn(Scope) -> Result<P>) -> Self {
        Self::new(Shape::HandleLocator, build)
    }

    /// Constructor taking handle, frames and locator.
    #[must_use]
    pub const fn handle_frames_locator(build: fn(Scope) -> Result<P>) -> Self {
        Self::new(Shape::HandleFramesLocator, build)
    }

    /// Accepted shape.
    #[inline]
    #[must_use]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub(crate) fn build(&self, scope: Scope) -> Result<P> {
        (self.build)(scope)
    }
}

// ============================================================================
// Scope
// ============================================================================

/// Where a part lives: a handle, a frame path from the top-level document
/// and an optional root locator.
///
/// Element operations resolve the frame path from the top every time.
#[derive(Debug, Clone)]
pub struct Scope {
    handle: Handle,
    frames: FramePath,
    locator: Option<Locator>,
}

impl Scope {
    /// Scope covering the whole surface of `handle`.
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            frames: FramePath::new(),
            locator: None,
        }
    }

    /// Child scope: frames are appended, the locator is replaced.
    #[must_use]
    pub fn child(&self, frames: Option<&FramePath>, locator: Option<Locator>) -> Self {
        Self {
            handle: self.handle.clone(),
            frames: match frames {
                Some(frames) => self.frames.join(frames),
                None => self.frames.clone(),
            },
            locator,
        }
    }

    /// Bound handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Full frame path from the top-level document.
    #[inline]
    #[must_use]
    pub fn frames(&self) -> &FramePath {
        &self.frames
    }

    /// Root element locator.
    #[inline]
    #[must_use]
    pub fn locator(&self) -> Option<&Locator> {
        self.locator.as_ref()
    }

    /// Finds elements inside this scope's frames.
    pub async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementId>> {
        self.handle.find_elements(&self.frames, locator).await
    }

    /// Returns `true` if at least one element matches.
    pub async fn exists(&self, locator: &Locator) -> Result<bool> {
        Ok(!self.find_all(locator).await?.is_empty())
    }

    /// Clicks the first matching element.
    pub async fn click(&self, locator: &Locator) -> Result<()> {
        self.handle.click(&self.frames, locator).await
    }

    /// Types into the first matching element.
    pub async fn type_text(&self, locator: &Locator, text: &str) -> Result<()> {
        self.handle.type_text(&self.frames, locator, text).await
    }

    /// Text of the first matching element.
    pub async fn text(&self, locator: &Locator) -> Result<String> {
        self.handle.text(&self.frames, locator).await
    }

    /// Text of the root element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PartResolution`] if the scope has no root locator.
    pub async fn root_text(&self) -> Result<String> {
        let locator = self
            .locator
            .as_ref()
            .ok_or_else(|| Error::part_resolution("Scope", "scope has no root locator"))?;
        self.text(locator).await
    }
}

// ============================================================================
// Fields & Slots
// ============================================================================

/// One decomposable field of a part.
pub struct Field<'a> {
    name: &'static str,
    slot: &'a mut (dyn SlotFill + Send),
}

impl fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("filled", &self.slot.is_filled())
            .finish()
    }
}

impl<'a> Field<'a> {
    /// Describes field `name` backed by `slot`.
    #[must_use]
    pub fn new(name: &'static str, slot: &'a mut (dyn SlotFill + Send)) -> Self {
        Self { name, slot }
    }

    /// Field name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn slot(&mut self) -> &mut (dyn SlotFill + Send) {
        &mut *self.slot
    }
}

/// Object-safe filling of a [`Slot`].
pub trait SlotFill: Send {
    /// Builds the nested part in `owner`'s scope and stores it.
    fn fill<'a>(&'a mut self, decomposer: &'a Decomposer, owner: &'a Scope) -> BoxFuture<'a, Result<()>>;

    /// Returns `true` once populated.
    fn is_filled(&self) -> bool;
}

/// Field holding a nested part.
///
/// Empty after construction; filled by the decomposer before the owning
/// part is handed out.
pub struct Slot<P: Part> {
    frames: Option<FramePath>,
    locator: Option<Locator>,
    value: Option<Intercepted<P>>,
}

impl<P: Part> fmt::Debug for Slot<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("part", &type_name::<P>())
            .field("frames", &self.frames)
            .field("locator", &self.locator)
            .field("filled", &self.value.is_some())
            .finish()
    }
}

impl<P: Part> Default for Slot<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Part> Slot<P> {
    /// Slot placed with the part's own descriptor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: None,
            locator: None,
            value: None,
        }
    }

    /// Places the part inside `frames`, relative to the owner.
    #[must_use]
    pub fn with_frames(mut self, frames: FramePath) -> Self {
        self.frames = Some(frames);
        self
    }

    /// Roots the part at `locator`.
    #[must_use]
    pub fn with_locator(mut self, locator: impl Into<Locator>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    /// The populated part.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PartResolution`] before population.
    pub fn get(&self) -> Result<&Intercepted<P>> {
        self.value
            .as_ref()
            .ok_or_else(|| Error::part_resolution(type_name::<P>(), "slot is not populated"))
    }
}

impl<P: Part> SlotFill for Slot<P> {
    fn fill<'a>(&'a mut self, decomposer: &'a Decomposer, owner: &'a Scope) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let part = decomposer
                .part::<P>(owner, self.frames.clone(), self.locator.clone())
                .await?;
            self.value = Some(part);
            Ok(())
        })
    }

    fn is_filled(&self) -> bool {
        self.value.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Empty;

    impl Part for Empty {
        fn constructors() -> Vec<Constructor<Self>> {
            vec![Constructor::handle(|_| Ok(Empty))]
        }
    }

    #[test]
    fn test_shape_of() {
        assert_eq!(Shape::of(false, false), Shape::Handle);
        assert_eq!(Shape::of(true, false), Shape::HandleFrames);
        assert_eq!(Shape::of(false, true), Shape::HandleLocator);
        assert_eq!(Shape::of(true, true), Shape::HandleFramesLocator);
        assert_eq!(Shape::HandleFrames.to_string(), "(handle, frames)");
    }

    #[test]
    fn test_empty_slot_reports_resolution_error() {
        let slot: Slot<Empty> = Slot::new().with_locator("#login");
        assert!(!slot.is_filled());
        assert!(matches!(slot.get(), Err(Error::PartResolution { .. })));
    }

    #[test]
    fn test_field_names() {
        let mut slot: Slot<Empty> = Slot::new();
        let field = Field::new("login", &mut slot);
        assert_eq!(field.name(), "login");
    }

    #[test]
    fn test_descriptor_defaults() {
        let descriptor = Descriptor::default()
            .with_frames(FramePath::new().index(0))
            .with_locator(Locator::id("main"));
        assert_eq!(descriptor.frames.map(|f| f.len()), Some(1));
        assert_eq!(Empty::descriptor(), Descriptor::default());
    }

    #[test]
    fn test_constructor_shape() {
        let ctor = Constructor::<Empty>::handle_locator(|_| Ok(Empty));
        assert_eq!(ctor.shape(), Shape::HandleLocator);
    }
}
