//! Optionally-empty callback handle.
//!
//! A [`Callback`] borrows a closure or function for `'a`. It is `Copy`, so
//! records holding one can be duplicated into containers freely, and an
//! empty handle is always safe to call: it returns `R::default()`.
//!
//! Callbacks take a single argument by reference. Several values are passed
//! as a tuple, e.g. `Callback<'_, (ConnectionState, ConnectionError)>`.
//!
//! ```rust
//! use iotlink::Callback;
//!
//! let double = |x: &u32| x * 2;
//! let mut cb: Callback<'_, u32, u32> = Callback::default();
//! assert_eq!(cb.call_callback(&21), 0);
//!
//! cb.set_callback(&double);
//! assert_eq!(cb.call_callback(&21), 42);
//! ```

use core::fmt;

/// Borrowed, optionally-empty function handle taking `&A` and returning `R`.
pub struct Callback<'a, A: ?Sized, R = ()> {
    function: Option<&'a (dyn Fn(&A) -> R + 'a)>,
}

impl<'a, A: ?Sized, R> Callback<'a, A, R> {
    /// Creates a handle wrapping `function`.
    pub const fn new(function: &'a (dyn Fn(&A) -> R + 'a)) -> Self {
        Self {
            function: Some(function),
        }
    }

    /// Creates an empty handle.
    pub const fn empty() -> Self {
        Self { function: None }
    }

    /// Replaces the wrapped function.
    pub fn set_callback(&mut self, function: &'a (dyn Fn(&A) -> R + 'a)) {
        self.function = Some(function);
    }

    /// Drops the wrapped function, leaving the handle empty.
    pub fn reset(&mut self) {
        self.function = None;
    }

    /// Whether a function is wrapped.
    pub fn is_set(&self) -> bool {
        self.function.is_some()
    }

    /// Invokes the wrapped function, or returns `R::default()` when empty.
    pub fn call_callback(&self, argument: &A) -> R
    where
        R: Default,
    {
        match self.function {
            Some(function) => function(argument),
            None => R::default(),
        }
    }

    /// Invokes the wrapped function if there is one.
    pub fn try_call(&self, argument: &A) -> Option<R> {
        self.function.map(|function| function(argument))
    }
}

impl<A: ?Sized, R> Clone for Callback<'_, A, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A: ?Sized, R> Copy for Callback<'_, A, R> {}

impl<A: ?Sized, R> Default for Callback<'_, A, R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a, A: ?Sized, R, F> From<&'a F> for Callback<'a, A, R>
where
    F: Fn(&A) -> R + 'a,
{
    fn from(function: &'a F) -> Self {
        Self::new(function)
    }
}

impl<A: ?Sized, R> fmt::Debug for Callback<'_, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("set", &self.is_set())
            .finish()
    }
}
