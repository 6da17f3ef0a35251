//! Dependency resolution from the application [`Context`](crate::context::Context).
//!
//! Each shared dependency in the context implements `FromRef<Context>`, and
//! services build themselves by resolving every field the same way:
//!
//! ```ignore
//! use sbmlgraph::FromRef;
//!
//! let ctx = Context::new(store, mapper, config)?;
//! let sync = SyncService::from_ref(&ctx);
//! ```

/// Trait for extracting a value from a reference to another type.
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

/// Any Clone type can be extracted from itself.
impl<T: Clone> FromRef<T> for T {
    fn from_ref(input: &T) -> Self {
        input.clone()
    }
}
