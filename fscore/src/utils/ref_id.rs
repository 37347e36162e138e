use std::{hash::Hash, ops::Deref, sync::Arc};

/// Identity key for a shared value.
///
/// Two `ArcRefId` are equal exactly when they point to the same allocation,
/// regardless of the value's structure. Used to recognise a relation that is
/// registered twice.
#[derive(Debug)]
pub struct ArcRefId<U: ?Sized>(Arc<U>);

impl<U: ?Sized> ArcRefId<U> {
    pub fn new(inner: Arc<U>) -> Self {
        Self(inner)
    }

    pub fn borrow_arc(&self) -> &Arc<U> {
        &self.0
    }

    pub fn take(self) -> Arc<U> {
        self.0
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl<U: ?Sized> Clone for ArcRefId<U> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<U: ?Sized> Deref for ArcRefId<U> {
    type Target = U;

    fn deref(&self) -> &U {
        &self.0
    }
}

impl<U: ?Sized> PartialEq for ArcRefId<U> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.addr(), other.addr())
    }
}

impl<U: ?Sized> Eq for ArcRefId<U> {}

impl<U: ?Sized> Hash for ArcRefId<U> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}
