//! Opaque application handle threaded through install hooks and modules.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Handle to the host application object.
///
/// The container never inspects it; it is handed unchanged to every module's
/// `configure` and every service's install hook. Services that know the
/// concrete host type can recover it with [`AppContext::get`].
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<dyn Any + Send + Sync>,
}

impl AppContext {
    pub fn new<T: Any + Send + Sync>(app: T) -> Self {
        Self {
            inner: Arc::new(app),
        }
    }

    /// Wrap an already shared host object without re-allocating.
    pub fn from_arc<T: Any + Send + Sync>(app: Arc<T>) -> Self {
        Self { inner: app }
    }

    /// A context carrying no host object.
    pub fn empty() -> Self {
        Self::new(())
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        (*self.inner).downcast_ref::<T>()
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct HostApp {
        name: &'static str,
    }

    #[test]
    fn recovers_concrete_host() {
        let ctx = AppContext::new(HostApp { name: "demo" });
        assert_eq!(ctx.get::<HostApp>().map(|a| a.name), Some("demo"));
        assert!(ctx.get::<String>().is_none());
    }

    #[test]
    fn clones_share_the_same_host() {
        let shared = Arc::new(HostApp { name: "shared" });
        let ctx = AppContext::from_arc(shared.clone());
        let copy = ctx.clone();
        let a = ctx.get::<HostApp>().unwrap() as *const HostApp;
        let b = copy.get::<HostApp>().unwrap() as *const HostApp;
        assert_eq!(a, b);
        assert_eq!(a, Arc::as_ptr(&shared));
    }
}
