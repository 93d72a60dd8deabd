//! One video player bound to one media element.

mod actions;
mod context_menu;
mod coordinator;
mod element;
mod focus;
mod mirror;
mod overlay_registry;
mod scrub;
mod shortcuts;

pub use actions::PlayerAction;
pub use context_menu::{
    clamp_menu_position, ContextMenuState, InputMethod, MenuPosition, MenuTrigger,
};
pub use coordinator::{EventOutcome, KeyInput, MediaEvent, PlayerEvent};
pub use element::{CaptionMode, CaptionTrack, PlaybackElement};
pub use focus::FocusManager;
pub use mirror::{
    recompute, LabelSet, MenuItemView, MenuView, MetaEntry, MirrorInputs, ModalView,
    PlaybackMode, TechStatus, VolumeLevel, STATUS_FAILED, STATUS_FETCHING,
};
pub use overlay_registry::{OverlayClient, OverlayKind, OverlayRegistry, PlayerId};
pub use scrub::{timeline_fraction, ScrubCommit, ScrubState};
pub use shortcuts::shortcut_for;

use crate::api::MetadataProbe;
use crate::cache::MetadataCache;
use crate::host::{NodeId, PageHost, Scheduler};
use crate::settings::PlayerSettings;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Node ids of everything one player renders, derived from its prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerNodes {
    pub prefix: String,
    pub container: NodeId,
    pub video: NodeId,
    pub timeline: NodeId,
    pub play_pause: NodeId,
    pub mute: NodeId,
    pub captions: NodeId,
    pub speed: NodeId,
    pub theater: NodeId,
    pub full_screen: NodeId,
    pub mini_player: NodeId,
    pub volume_slider: NodeId,
    pub context_menu: NodeId,
    pub modal_overlay: NodeId,
    pub modal_dialog: NodeId,
    pub modal_close: NodeId,
    pub tech_toggle: NodeId,
    pub tech_panel: NodeId,
}

impl PlayerNodes {
    pub fn with_prefix(prefix: &str) -> Self {
        let node = |suffix: &str| NodeId::new(format!("{prefix}-{suffix}"));
        Self {
            prefix: prefix.to_string(),
            container: NodeId::new(prefix),
            video: node("video"),
            timeline: node("timeline"),
            play_pause: node("play-pause"),
            mute: node("mute"),
            captions: node("captions"),
            speed: node("speed"),
            theater: node("theater"),
            full_screen: node("full-screen"),
            mini_player: node("mini-player"),
            volume_slider: node("volume"),
            context_menu: node("menu"),
            modal_overlay: node("about-overlay"),
            modal_dialog: node("about-dialog"),
            modal_close: node("about-close"),
            tech_toggle: node("tech-toggle"),
            tech_panel: node("tech-panel"),
        }
    }

    pub fn menu_item(&self, action: PlayerAction) -> NodeId {
        NodeId::new(format!("{}-menu-{}", self.prefix, action.key()))
    }
}

/// Collaborators shared by every player on a page.
#[derive(Clone)]
pub struct PlayerEnv {
    pub page: Rc<dyn PageHost>,
    pub scheduler: Rc<dyn Scheduler>,
    pub cache: MetadataCache,
    pub overlays: OverlayRegistry,
    pub settings: Rc<PlayerSettings>,
}

impl PlayerEnv {
    pub fn new(
        page: Rc<dyn PageHost>,
        scheduler: Rc<dyn Scheduler>,
        probe: Box<dyn MetadataProbe>,
        settings: PlayerSettings,
    ) -> Self {
        let cache = MetadataCache::new(probe, scheduler.clone());
        Self {
            page,
            scheduler,
            cache,
            overlays: OverlayRegistry::default(),
            settings: Rc::new(settings),
        }
    }
}

/// UI-only state owned by one player.
#[derive(Debug, Default)]
pub struct PlayerState {
    pub scrub: ScrubState,
    pub preview_fraction: f64,
    pub theater: bool,
    pub menu: ContextMenuState,
    pub modal_open: bool,
    pub tech_panel_expanded: bool,
    pub focus: FocusManager,
}

/// Receives fresh labels after every state change.
pub trait ViewSink {
    fn present(&self, labels: &LabelSet);
}

impl<F: Fn(&LabelSet)> ViewSink for F {
    fn present(&self, labels: &LabelSet) {
        self(labels)
    }
}

struct PlayerInner {
    me: Weak<PlayerInner>,
    id: PlayerId,
    env: PlayerEnv,
    nodes: PlayerNodes,
    element: Rc<dyn PlaybackElement>,
    sink: Box<dyn ViewSink>,
    state: RefCell<PlayerState>,
    labels: RefCell<LabelSet>,
    destroyed: Cell<bool>,
}

/// Handle to a player. Clones share the same instance.
#[derive(Clone)]
pub struct VideoPlayer {
    inner: Rc<PlayerInner>,
}

impl VideoPlayer {
    pub fn new(
        env: PlayerEnv,
        nodes: PlayerNodes,
        element: Rc<dyn PlaybackElement>,
        sink: impl ViewSink + 'static,
    ) -> Self {
        let inner = Rc::new_cyclic(|me: &Weak<PlayerInner>| {
            let client: Weak<dyn OverlayClient> = me.clone();
            let id = env.overlays.register(client);
            PlayerInner {
                me: me.clone(),
                id,
                env,
                nodes,
                element,
                sink: Box::new(sink),
                state: RefCell::new(PlayerState::default()),
                labels: RefCell::new(LabelSet::default()),
                destroyed: Cell::new(false),
            }
        });
        if inner.element.caption_track().is_some() {
            inner.element.set_caption_mode(CaptionMode::Hidden);
        }
        log::debug!("player {} bound", inner.nodes.prefix);
        inner.refresh();
        Self { inner }
    }

    pub fn id(&self) -> PlayerId {
        self.inner.id
    }

    pub fn nodes(&self) -> &PlayerNodes {
        &self.inner.nodes
    }

    pub fn labels(&self) -> LabelSet {
        self.inner.labels.borrow().clone()
    }

    pub fn is_context_menu_open(&self) -> bool {
        self.inner.state.borrow().menu.open
    }

    pub fn is_modal_open(&self) -> bool {
        self.inner.state.borrow().modal_open
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    /// Route one input event. A destroyed player ignores everything.
    pub fn dispatch(&self, event: PlayerEvent) -> EventOutcome {
        self.inner.dispatch(event)
    }

    /// Remove the menu and dialog from the page and stop reacting to events.
    pub fn destroy(&self) {
        self.inner.destroy();
    }
}

impl PlayerInner {
    fn refresh(&self) {
        if self.destroyed.get() {
            return;
        }
        let labels = {
            let state = self.state.borrow();
            recompute(&MirrorInputs {
                element: self.element.as_ref(),
                page: self.env.page.as_ref(),
                nodes: &self.nodes,
                state: &state,
                cache: &self.env.cache,
                settings: &self.env.settings,
            })
        };
        *self.labels.borrow_mut() = labels;
        self.sink.present(&self.labels.borrow());
    }

    fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        {
            let mut state = self.state.borrow_mut();
            state.menu.open = false;
            state.modal_open = false;
            state.scrub = ScrubState::Idle;
        }
        let overlays = &self.env.overlays;
        overlays.release(OverlayKind::ContextMenu, self.id);
        overlays.release(OverlayKind::Modal, self.id);
        overlays.unregister(self.id);
        self.env.page.detach(&self.nodes.context_menu);
        self.env.page.detach(&self.nodes.modal_overlay);
        log::debug!("player {} destroyed", self.nodes.prefix);
    }
}

impl OverlayClient for PlayerInner {
    fn dismiss(&self, kind: OverlayKind) {
        match kind {
            OverlayKind::ContextMenu => self.hide_context_menu(),
            OverlayKind::Modal => self.close_modal(),
        }
    }
}
