use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// What the engine needs from a context.
pub trait PipelineContext {
    type Error;

    /// A response has been produced; the enter phase must stop.
    fn has_response(&self) -> bool;

    /// The error currently being unwound, if any.
    ///
    /// Leave hooks can inspect it, replace it, or `take()` it to recover.
    fn error_slot(&mut self) -> &mut Option<Self::Error>;
}

/// A single phase hook.
pub type Hook<C> =
    Arc<dyn Fn(&mut C) -> Result<(), <C as PipelineContext>::Error> + Send + Sync>;

/// A named step with optional enter and leave hooks.
///
/// A missing hook passes the context through unchanged for that phase.
pub struct Interceptor<C: PipelineContext> {
    name: Cow<'static, str>,
    enter: Option<Hook<C>>,
    leave: Option<Hook<C>>,
}

impl<C: PipelineContext> Interceptor<C> {
    /// An interceptor with no hooks. Add them with [`with_enter`](Self::with_enter)
    /// and [`with_leave`](Self::with_leave).
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            enter: None,
            leave: None,
        }
    }

    /// Enter-only interceptor.
    pub fn enter<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(&mut C) -> Result<(), C::Error> + Send + Sync + 'static,
    {
        Self::new(name).with_enter(f)
    }

    /// Leave-only interceptor.
    pub fn leave<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(&mut C) -> Result<(), C::Error> + Send + Sync + 'static,
    {
        Self::new(name).with_leave(f)
    }

    /// Interceptor with both hooks.
    pub fn around<E, L>(name: impl Into<Cow<'static, str>>, enter: E, leave: L) -> Self
    where
        E: Fn(&mut C) -> Result<(), C::Error> + Send + Sync + 'static,
        L: Fn(&mut C) -> Result<(), C::Error> + Send + Sync + 'static,
    {
        Self::new(name).with_enter(enter).with_leave(leave)
    }

    pub fn with_enter<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut C) -> Result<(), C::Error> + Send + Sync + 'static,
    {
        self.enter = Some(Arc::new(f));
        self
    }

    pub fn with_leave<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut C) -> Result<(), C::Error> + Send + Sync + 'static,
    {
        self.leave = Some(Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_enter(&self) -> bool {
        self.enter.is_some()
    }

    pub fn has_leave(&self) -> bool {
        self.leave.is_some()
    }

    pub(crate) fn run_enter(&self, ctx: &mut C) -> Result<(), C::Error> {
        match &self.enter {
            Some(hook) => hook(ctx),
            None => Ok(()),
        }
    }

    pub(crate) fn run_leave(&self, ctx: &mut C) -> Result<(), C::Error> {
        match &self.leave {
            Some(hook) => hook(ctx),
            None => Ok(()),
        }
    }
}

// Derived impls would require `C: Clone` / `C: Debug`.
impl<C: PipelineContext> Clone for Interceptor<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            enter: self.enter.clone(),
            leave: self.leave.clone(),
        }
    }
}

impl<C: PipelineContext> fmt::Debug for Interceptor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("name", &self.name)
            .field("enter", &self.enter.is_some())
            .field("leave", &self.leave.is_some())
            .finish()
    }
}
