//! Boundary to the RPC channel that carries requests to the backend.

use std::future::Future;

use futures::channel::oneshot;
use serde_json::{Map, Value};

/// Request/response half of the backend connection.
///
/// Implementations invoke `callback` exactly once with the JSON result. Push events arrive
/// through a separate path and are fed to [`Session::handle_json`](crate::Session::handle_json).
pub trait Transport {
    fn call(
        &self,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
        callback: Box<dyn FnOnce(Value)>,
    );
}

/// Error returned by [`call_future`] when the transport dropped the callback without calling it.
pub use futures::channel::oneshot::Canceled;

/// Issues `method` and resolves with its result.
pub fn call_future(
    transport: &dyn Transport,
    method: &str,
    args: Vec<Value>,
    kwargs: Map<String, Value>,
) -> impl Future<Output = Result<Value, Canceled>> + 'static {
    let (tx, rx) = oneshot::channel();
    transport.call(
        method,
        args,
        kwargs,
        Box::new(move |result| {
            let _ = tx.send(result);
        }),
    );
    rx
}
