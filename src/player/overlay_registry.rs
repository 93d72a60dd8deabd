use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Overlays that may be open on at most one player at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    ContextMenu,
    Modal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerId(u64);

/// Implemented by players so the registry can close another player's overlay.
pub trait OverlayClient {
    fn dismiss(&self, kind: OverlayKind);
}

#[derive(Default)]
struct RegistryState {
    clients: HashMap<PlayerId, Weak<dyn OverlayClient>>,
    open: HashMap<OverlayKind, PlayerId>,
}

/// Page-wide record of which player owns each overlay kind.
#[derive(Clone, Default)]
pub struct OverlayRegistry {
    state: Rc<RefCell<RegistryState>>,
    next_id: Rc<Cell<u64>>,
}

impl OverlayRegistry {
    pub fn register(&self, client: Weak<dyn OverlayClient>) -> PlayerId {
        let id = PlayerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.state.borrow_mut().clients.insert(id, client);
        id
    }

    pub fn unregister(&self, id: PlayerId) {
        let mut state = self.state.borrow_mut();
        state.clients.remove(&id);
        state.open.retain(|_, owner| *owner != id);
    }

    /// Make `id` the owner of `kind`. Returns the player that owned it before,
    /// which the caller must dismiss once this call has returned.
    pub fn claim(&self, kind: OverlayKind, id: PlayerId) -> Option<Rc<dyn OverlayClient>> {
        let mut state = self.state.borrow_mut();
        let previous = state.open.insert(kind, id)?;
        if previous == id {
            return None;
        }
        state.clients.get(&previous).and_then(Weak::upgrade)
    }

    /// Give up `kind` if `id` still owns it.
    pub fn release(&self, kind: OverlayKind, id: PlayerId) {
        let mut state = self.state.borrow_mut();
        if state.open.get(&kind) == Some(&id) {
            state.open.remove(&kind);
        }
    }

    pub fn owner(&self, kind: OverlayKind) -> Option<PlayerId> {
        self.state.borrow().open.get(&kind).copied()
    }
}
