//! Handler and hook types, and the error a handler reports.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use crate::namespace::Namespace;

/// Failure raised by a handler or an argument hook.
///
/// Carries a kind (shown before the message in terse reports), the error
/// itself with its cause chain, and the stack captured where the failure
/// was created. `?` converts any standard error and takes the kind from its
/// type name, so `"x".parse::<i64>()?` fails with kind `ParseIntError`.
///
/// Like `anyhow::Error`, this type does not implement `std::error::Error`
/// itself; that is what makes the blanket conversion possible.
pub struct HandlerError {
    kind: Cow<'static, str>,
    inner: anyhow::Error,
    backtrace: Backtrace,
}

pub type HandlerResult<T = ()> = std::result::Result<T, HandlerError>;

impl HandlerError {
    /// Failure with an explicit kind, e.g. `HandlerError::new("ValueError", "doom and gloom")`.
    pub fn new<M>(kind: impl Into<Cow<'static, str>>, message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self::from_anyhow(kind, anyhow::Error::msg(message))
    }

    /// Wrap an `anyhow` error, keeping its cause chain.
    pub fn from_anyhow(kind: impl Into<Cow<'static, str>>, error: anyhow::Error) -> Self {
        Self {
            kind: kind.into(),
            inner: error,
            backtrace: Backtrace::force_capture(),
        }
    }

    /// Push a context message on top; the kind is kept.
    pub fn context<C>(self, context: C) -> Self
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        Self {
            inner: self.inner.context(context),
            ..self
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Outermost message, without causes.
    pub fn message(&self) -> String {
        self.inner.to_string()
    }

    /// Messages of the underlying causes, outermost first, excluding the
    /// top-level message.
    pub fn causes(&self) -> impl Iterator<Item = String> + '_ {
        self.inner.chain().skip(1).map(ToString::to_string)
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    pub fn into_anyhow(self) -> anyhow::Error {
        self.inner
    }
}

impl<E> From<E> for HandlerError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::from_anyhow(kind_of::<E>(), anyhow::Error::new(error))
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.inner)
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerError")
            .field("kind", &self.kind)
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

/// Short type name of an error. A bare `Error` keeps its nearest module so
/// `std::io::Error` reads `io::Error` rather than `Error`.
fn kind_of<E>() -> Cow<'static, str> {
    let full = std::any::type_name::<E>();
    let path = full.split('<').next().unwrap_or(full);
    let mut segments = path.rsplit("::");
    let last = segments.next().unwrap_or(path);
    if last != "Error" {
        return Cow::Borrowed(last);
    }
    match segments.find(|s| *s != "error") {
        Some(module) => Cow::Owned(format!("{module}::Error")),
        None => Cow::Borrowed(last),
    }
}

/// A registered command handler. Cloning shares the same function, so the
/// value returned from registration stays directly callable.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&Namespace) -> HandlerResult>);

impl Handler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Namespace) -> HandlerResult + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn call(&self, args: &Namespace) -> HandlerResult {
        (self.0)(args)
    }

    /// Whether both values wrap the same registered function.
    pub fn same_as(&self, other: &Handler) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

/// Group-level hook transforming parsed arguments before the handler runs.
#[derive(Clone)]
pub struct ArgProcessor(Rc<dyn Fn(Namespace) -> HandlerResult<Namespace>>);

impl ArgProcessor {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Namespace) -> HandlerResult<Namespace> + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn apply(&self, args: Namespace) -> HandlerResult<Namespace> {
        (self.0)(args)
    }
}

impl fmt::Debug for ArgProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ArgProcessor(..)")
    }
}
