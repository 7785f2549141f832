//! Identity keys.
//!
//! The limiter is generic over any `Hash + Eq` key, which gives value
//! equality. Callers that want two equal-but-distinct objects to be limited
//! separately wrap them in [`ByIdentity`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An `Arc<T>` compared and hashed by pointer address.
///
/// ```rust
/// use std::sync::Arc;
/// use workgate::ByIdentity;
///
/// let a = Arc::new(String::from("timeout"));
/// let b = Arc::new(String::from("timeout"));
///
/// assert_ne!(ByIdentity::new(a.clone()), ByIdentity::new(b));
/// assert_eq!(ByIdentity::new(a.clone()), ByIdentity::new(a));
/// ```
pub struct ByIdentity<T: ?Sized>(Arc<T>);

impl<T: ?Sized> ByIdentity<T> {
    /// Wraps an `Arc` so that it keys by identity.
    pub fn new(inner: Arc<T>) -> Self {
        Self(inner)
    }

    /// Returns the wrapped value.
    pub fn get(&self) -> &Arc<T> {
        &self.0
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl<T: ?Sized> Clone for ByIdentity<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> PartialEq for ByIdentity<T> {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl<T: ?Sized> Eq for ByIdentity<T> {}

impl<T: ?Sized> Hash for ByIdentity<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for ByIdentity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ByIdentity")
            .field(&self.addr())
            .field(&&*self.0)
            .finish()
    }
}

impl<T: ?Sized> From<Arc<T>> for ByIdentity<T> {
    fn from(inner: Arc<T>) -> Self {
        Self::new(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identity_not_value() {
        let first = Arc::new(5u32);
        let second = Arc::new(5u32);

        let mut set = HashSet::new();
        set.insert(ByIdentity::new(first.clone()));
        set.insert(ByIdentity::new(second));
        set.insert(ByIdentity::from(first));

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_unsized_and_debug() {
        let shared: Arc<str> = Arc::from("disk full");
        let key = ByIdentity::new(shared.clone());

        assert_eq!(key.clone(), key);
        assert_eq!(&**key.get(), "disk full");
        assert!(format!("{:?}", key).contains("disk full"));
    }
}
