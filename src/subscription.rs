use std::{
    mem::take,
    rc::{Rc, Weak},
};


/// Registration handle returned by `subscribe`.
///
/// The callback stays registered until this value is dropped or [`unsubscribe`](Self::unsubscribe)
/// is called. Use [`detach`](Self::detach) to keep it registered for the lifetime of its source.
#[derive(Default)]
#[must_use]
pub struct Subscription(RawSubscription);

impl Subscription {
    pub fn empty() -> Self {
        Subscription(RawSubscription::Empty)
    }
    pub fn from_fn(f: impl FnOnce() + 'static) -> Self {
        Subscription(RawSubscription::Fn(Box::new(f)))
    }

    /// Runs `unsubscribe` on drop if `this` is still alive.
    pub fn from_weak_fn<T: 'static>(
        this: Weak<T>,
        unsubscribe: impl FnOnce(Rc<T>) + 'static,
    ) -> Self {
        Subscription(RawSubscription::Fn(Box::new(move || {
            if let Some(this) = this.upgrade() {
                unsubscribe(this)
            }
        })))
    }

    pub fn unsubscribe(self) {
        drop(self)
    }

    /// Leaves the callback registered.
    pub fn detach(mut self) {
        self.0 = RawSubscription::Empty;
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.0, RawSubscription::Empty)
    }
}
impl Drop for Subscription {
    fn drop(&mut self) {
        match take(&mut self.0) {
            RawSubscription::Empty => {}
            RawSubscription::Fn(f) => f(),
        }
    }
}
impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.is_empty() { "empty" } else { "active" };
        f.debug_tuple("Subscription").field(&state).finish()
    }
}

#[derive(Default)]
enum RawSubscription {
    #[default]
    Empty,
    Fn(Box<dyn FnOnce() + 'static>),
}
