use parking_lot::RwLock;

/// Authenticated identity as resolved by the host's auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub credential: String,
    pub user_id: String,
}

/// Resolves the identity to attach to a request, if any.
pub trait IdentityProvider: Send + Sync {
    fn current(&self) -> Option<Identity>;
}

/// Anonymous visitors only.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousIdentity;

impl IdentityProvider for AnonymousIdentity {
    fn current(&self) -> Option<Identity> {
        None
    }
}

/// Identity slot the host updates on sign-in and sign-out.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    slot: RwLock<Option<Identity>>,
}

impl StaticIdentity {
    pub fn new(identity: Option<Identity>) -> Self {
        Self { slot: RwLock::new(identity) }
    }

    pub fn set(&self, identity: Identity) {
        *self.slot.write() = Some(identity);
    }

    pub fn clear(&self) {
        *self.slot.write() = None;
    }
}

impl IdentityProvider for StaticIdentity {
    fn current(&self) -> Option<Identity> {
        self.slot.read().clone()
    }
}
