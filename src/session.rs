use std::{cell::RefCell, rc::Rc};

use parse_display::Display;
use serde_json::{Map, Value};

use crate::{
    config::SessionConfig,
    decode::{decode, Decoded},
    event::PushEvent,
    patch::{apply_tree_update, get_at_path, PatchError},
    store::{ParamValue, ParameterStore},
    transport::{call_future, Canceled, Transport},
    wire::{WireMap, WireValue},
};


#[derive(Display, Debug)]
pub enum SessionError {
    /// The cached tree could not be patched; refetch the affected service.
    #[display("{0}")]
    Patch(PatchError),
    #[display("malformed payload: {0}")]
    Payload(serde_json::Error),
    #[display("unknown service `{0}`")]
    UnknownService(String),
    #[display("request was dropped by the transport")]
    Canceled,
}

impl SessionError {
    /// Whether the caller should fetch a full snapshot to recover.
    pub fn needs_refetch(&self) -> bool {
        matches!(self, SessionError::Patch(_))
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Patch(e) => Some(e),
            SessionError::Payload(e) => Some(e),
            SessionError::UnknownService(_) | SessionError::Canceled => None,
        }
    }
}
impl From<PatchError> for SessionError {
    fn from(e: PatchError) -> Self {
        SessionError::Patch(e)
    }
}
impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        SessionError::Payload(e)
    }
}
impl From<Canceled> for SessionError {
    fn from(_: Canceled) -> Self {
        SessionError::Canceled
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// State cache for one dashboard session.
///
/// Holds the flat parameter store and the tree of service snapshots. Cloning the handle
/// shares the session.
#[derive(Clone)]
pub struct Session(Rc<SessionData>);

struct SessionData {
    config: SessionConfig,
    parameters: ParameterStore,
    tree: RefCell<WireMap>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self(Rc::new(SessionData {
            config,
            parameters: ParameterStore::new(),
            tree: RefCell::new(WireMap::new()),
        }))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.0.config
    }
    pub fn parameters(&self) -> &ParameterStore {
        &self.0.parameters
    }

    /// Current tree root. Cheap: children are shared, not copied.
    pub fn tree(&self) -> WireMap {
        self.0.tree.borrow().clone()
    }

    /// Replaces the cached snapshot of `service`.
    pub fn load_snapshot(&self, service: &str, snapshot: WireValue) -> SessionResult<()> {
        if !self.0.config.is_known_service(service) {
            return Err(SessionError::UnknownService(service.to_owned()));
        }
        log::debug!("loaded snapshot of `{service}`");
        self.0
            .tree
            .borrow_mut()
            .insert(service.to_owned(), Rc::new(snapshot));
        Ok(())
    }

    pub fn load_snapshot_json(&self, service: &str, snapshot: Value) -> SessionResult<()> {
        let snapshot = serde_json::from_value(snapshot)?;
        self.load_snapshot(service, snapshot)
    }

    /// Stores a full set of flat parameter values.
    pub fn load_parameters<K: AsRef<str>>(
        &self,
        values: impl IntoIterator<Item = (K, ParamValue)>,
    ) {
        self.0.parameters.bulk_set(values);
    }

    /// Requests a fresh snapshot of `service` and loads it when the reply arrives.
    ///
    /// Failures in the reply are logged. Use [`refresh_async`](Self::refresh_async) to
    /// observe them.
    pub fn refresh(&self, transport: &dyn Transport, service: &str) -> SessionResult<()> {
        if !self.0.config.is_known_service(service) {
            return Err(SessionError::UnknownService(service.to_owned()));
        }
        let this = self.clone();
        let name = service.to_owned();
        transport.call(
            &self.0.config.snapshot_method_for(service),
            Vec::new(),
            Map::new(),
            Box::new(move |result| {
                if let Err(e) = this.load_snapshot_json(&name, result) {
                    log::warn!("discarding snapshot of `{name}`: {e}");
                }
            }),
        );
        Ok(())
    }

    pub async fn refresh_async(
        &self,
        transport: &dyn Transport,
        service: &str,
    ) -> SessionResult<()> {
        if !self.0.config.is_known_service(service) {
            return Err(SessionError::UnknownService(service.to_owned()));
        }
        let method = self.0.config.snapshot_method_for(service);
        let result = call_future(transport, &method, Vec::new(), Map::new()).await?;
        self.load_snapshot_json(service, result)
    }

    /// Applies a pushed event. On error the session is left unchanged.
    pub fn handle_event(&self, event: &PushEvent) -> SessionResult<()> {
        match event {
            PushEvent::Parameter(update) => {
                self.0.parameters.set(&update.id, update.value.clone());
            }
            PushEvent::Tree { data } => {
                let patched = apply_tree_update(&self.0.tree.borrow(), data)?;
                *self.0.tree.borrow_mut() = patched;
            }
        }
        Ok(())
    }

    pub fn handle_json(&self, payload: &Value) -> SessionResult<()> {
        self.handle_event(&PushEvent::from_json(payload)?)
    }

    pub fn node(&self, path: &str) -> SessionResult<Rc<WireValue>> {
        Ok(get_at_path(&self.0.tree.borrow(), path)?.clone())
    }

    pub fn decoded(&self, path: &str) -> SessionResult<Decoded> {
        Ok(decode(&*self.node(path)?))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
