//! In-memory page and media element.
//! The unit tests drive the coordinator through these, and the desktop bridge
//! keeps them in step with the webview's real DOM.

use crate::host::{ElementKind, NodeId, PageHost, Rect, Viewport};
use crate::player::{CaptionMode, CaptionTrack, PlaybackElement, PlayerAction, PlayerNodes};
use std::cell::{Cell, RefCell};

#[derive(Debug, Clone)]
struct HeadlessNode {
    id: NodeId,
    parent: Option<NodeId>,
    kind: ElementKind,
    focusable: bool,
    disabled: bool,
    rect: Rect,
}

#[derive(Debug)]
struct PageState {
    // Document order.
    nodes: Vec<HeadlessNode>,
    active: Option<NodeId>,
    fullscreen: Option<NodeId>,
    picture_in_picture: Option<NodeId>,
    picture_in_picture_supported: bool,
    viewport: Viewport,
    title: String,
    base_url: String,
}

pub struct HeadlessPage {
    state: RefCell<PageState>,
}

impl Default for HeadlessPage {
    fn default() -> Self {
        Self::new("https://localhost/")
    }
}

impl HeadlessPage {
    pub fn new(base_url: &str) -> Self {
        Self {
            state: RefCell::new(PageState {
                nodes: Vec::new(),
                active: None,
                fullscreen: None,
                picture_in_picture: None,
                picture_in_picture_supported: true,
                viewport: Viewport {
                    width: 1280.0,
                    height: 720.0,
                },
                title: String::new(),
                base_url: base_url.to_string(),
            }),
        }
    }

    /// Append a node under `parent` (or at the document root).
    pub fn insert(&self, id: &NodeId, parent: Option<&NodeId>, kind: ElementKind, focusable: bool) {
        let mut state = self.state.borrow_mut();
        state.nodes.retain(|node| &node.id != id);
        state.nodes.push(HeadlessNode {
            id: id.clone(),
            parent: parent.cloned(),
            kind,
            focusable,
            disabled: false,
            rect: Rect::default(),
        });
    }

    /// Remove a node and everything beneath it.
    pub fn remove(&self, id: &NodeId) {
        let doomed: Vec<NodeId> = {
            let state = self.state.borrow();
            state
                .nodes
                .iter()
                .filter(|node| Self::is_within(&state.nodes, id, &node.id))
                .map(|node| node.id.clone())
                .collect()
        };
        let mut state = self.state.borrow_mut();
        state.nodes.retain(|node| !doomed.contains(&node.id));
        if state.active.as_ref().is_some_and(|active| doomed.contains(active)) {
            state.active = None;
        }
    }

    pub fn has_node(&self, id: &NodeId) -> bool {
        self.state.borrow().nodes.iter().any(|node| &node.id == id)
    }

    pub fn set_disabled(&self, id: &NodeId, disabled: bool) {
        if let Some(node) = self.state.borrow_mut().nodes.iter_mut().find(|n| &n.id == id) {
            node.disabled = disabled;
        }
    }

    pub fn set_rect(&self, id: &NodeId, rect: Rect) {
        if let Some(node) = self.state.borrow_mut().nodes.iter_mut().find(|n| &n.id == id) {
            node.rect = rect;
        }
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.state.borrow_mut().viewport = viewport;
    }

    pub fn set_title(&self, title: &str) {
        self.state.borrow_mut().title = title.to_string();
    }

    pub fn set_base_url(&self, base_url: &str) {
        self.state.borrow_mut().base_url = base_url.to_string();
    }

    /// Record a fullscreen change reported by the document.
    pub fn set_fullscreen_element(&self, id: Option<&NodeId>) {
        self.state.borrow_mut().fullscreen = id.cloned();
    }

    pub fn set_picture_in_picture_element(&self, id: Option<&NodeId>) {
        self.state.borrow_mut().picture_in_picture = id.cloned();
    }

    pub fn set_picture_in_picture_supported(&self, supported: bool) {
        self.state.borrow_mut().picture_in_picture_supported = supported;
    }

    /// Record focus that moved without going through the player.
    pub fn note_focus(&self, id: Option<&NodeId>) {
        self.state.borrow_mut().active = id.cloned();
    }

    /// Lay out the node tree the shell renders for one player.
    pub fn register_player(&self, nodes: &PlayerNodes) {
        let container = &nodes.container;
        self.insert(container, None, ElementKind::Other, true);
        self.insert(&nodes.video, Some(container), ElementKind::Other, true);
        self.insert(&nodes.timeline, Some(container), ElementKind::Other, false);
        for button in [
            &nodes.play_pause,
            &nodes.mute,
            &nodes.captions,
            &nodes.speed,
            &nodes.mini_player,
            &nodes.theater,
            &nodes.full_screen,
        ] {
            self.insert(button, Some(container), ElementKind::Button, true);
        }
        self.insert(&nodes.volume_slider, Some(container), ElementKind::Input, true);

        self.insert(&nodes.context_menu, None, ElementKind::Other, false);
        for action in PlayerAction::MENU {
            self.insert(
                &nodes.menu_item(action),
                Some(&nodes.context_menu),
                ElementKind::Button,
                true,
            );
        }

        self.insert(&nodes.modal_overlay, None, ElementKind::Other, false);
        self.insert(&nodes.modal_dialog, Some(&nodes.modal_overlay), ElementKind::Other, false);
        self.insert(&nodes.modal_close, Some(&nodes.modal_dialog), ElementKind::Button, true);
        self.insert(&nodes.tech_toggle, Some(&nodes.modal_dialog), ElementKind::Button, true);
        self.insert(&nodes.tech_panel, Some(&nodes.modal_dialog), ElementKind::Other, false);
    }

    fn is_within(nodes: &[HeadlessNode], ancestor: &NodeId, node: &NodeId) -> bool {
        let mut current = Some(node.clone());
        while let Some(id) = current {
            if &id == ancestor {
                return true;
            }
            current = nodes
                .iter()
                .find(|candidate| candidate.id == id)
                .and_then(|candidate| candidate.parent.clone());
        }
        false
    }
}

impl PageHost for HeadlessPage {
    fn active_element(&self) -> Option<NodeId> {
        self.state.borrow().active.clone()
    }

    fn element_kind(&self, node: &NodeId) -> ElementKind {
        self.state
            .borrow()
            .nodes
            .iter()
            .find(|candidate| &candidate.id == node)
            .map(|candidate| candidate.kind)
            .unwrap_or(ElementKind::Other)
    }

    fn focus(&self, node: &NodeId) {
        if self.is_focusable(node) {
            self.state.borrow_mut().active = Some(node.clone());
        }
    }

    fn blur(&self, node: &NodeId) {
        let mut state = self.state.borrow_mut();
        if state.active.as_ref() == Some(node) {
            state.active = None;
        }
    }

    fn contains(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        let state = self.state.borrow();
        state.nodes.iter().any(|candidate| &candidate.id == node)
            && Self::is_within(&state.nodes, ancestor, node)
    }

    fn is_focusable(&self, node: &NodeId) -> bool {
        self.state
            .borrow()
            .nodes
            .iter()
            .any(|candidate| &candidate.id == node && candidate.focusable && !candidate.disabled)
    }

    fn focusable_within(&self, scope: &NodeId) -> Vec<NodeId> {
        let state = self.state.borrow();
        state
            .nodes
            .iter()
            .filter(|node| &node.id != scope)
            .filter(|node| node.focusable && !node.disabled)
            .filter(|node| Self::is_within(&state.nodes, scope, &node.id))
            .map(|node| node.id.clone())
            .collect()
    }

    fn bounding_rect(&self, node: &NodeId) -> Rect {
        self.state
            .borrow()
            .nodes
            .iter()
            .find(|candidate| &candidate.id == node)
            .map(|candidate| candidate.rect)
            .unwrap_or_default()
    }

    fn viewport(&self) -> Viewport {
        self.state.borrow().viewport
    }

    fn fullscreen_element(&self) -> Option<NodeId> {
        self.state.borrow().fullscreen.clone()
    }

    fn request_fullscreen(&self, node: &NodeId) {
        self.state.borrow_mut().fullscreen = Some(node.clone());
    }

    fn exit_fullscreen(&self) {
        self.state.borrow_mut().fullscreen = None;
    }

    fn picture_in_picture_supported(&self) -> bool {
        self.state.borrow().picture_in_picture_supported
    }

    fn picture_in_picture_element(&self) -> Option<NodeId> {
        self.state.borrow().picture_in_picture.clone()
    }

    fn request_picture_in_picture(&self, video: &NodeId) {
        let mut state = self.state.borrow_mut();
        if state.picture_in_picture_supported {
            state.picture_in_picture = Some(video.clone());
        }
    }

    fn exit_picture_in_picture(&self) {
        self.state.borrow_mut().picture_in_picture = None;
    }

    fn document_title(&self) -> String {
        self.state.borrow().title.clone()
    }

    fn base_url(&self) -> String {
        self.state.borrow().base_url.clone()
    }

    fn detach(&self, node: &NodeId) {
        self.remove(node);
    }
}

/// Media element that keeps its state in memory and never decodes anything.
pub struct MemoryElement {
    current_time: Cell<f64>,
    duration: Cell<f64>,
    paused: Cell<bool>,
    volume: Cell<f64>,
    muted: Cell<bool>,
    playback_rate: Cell<f64>,
    src: RefCell<String>,
    video_size: Cell<(u32, u32)>,
    caption_track: RefCell<Option<CaptionTrack>>,
    title: RefCell<Option<String>>,
}

impl MemoryElement {
    pub fn new(src: &str) -> Self {
        Self {
            current_time: Cell::new(0.0),
            duration: Cell::new(f64::NAN),
            paused: Cell::new(true),
            volume: Cell::new(1.0),
            muted: Cell::new(false),
            playback_rate: Cell::new(1.0),
            src: RefCell::new(src.to_string()),
            video_size: Cell::new((0, 0)),
            caption_track: RefCell::new(None),
            title: RefCell::new(None),
        }
    }

    /// Simulate metadata arriving.
    pub fn load_metadata(&self, duration: f64, width: u32, height: u32) {
        self.duration.set(duration);
        self.video_size.set((width, height));
    }

    pub fn set_src(&self, src: &str) {
        *self.src.borrow_mut() = src.to_string();
    }

    pub fn set_caption_track(&self, track: Option<CaptionTrack>) {
        *self.caption_track.borrow_mut() = track;
    }

    pub fn set_title(&self, title: Option<&str>) {
        *self.title.borrow_mut() = title.map(str::to_string);
    }
}

impl PlaybackElement for MemoryElement {
    fn current_time(&self) -> f64 {
        self.current_time.get()
    }

    fn set_current_time(&self, seconds: f64) {
        let duration = self.duration.get();
        let upper = if duration.is_finite() { duration } else { f64::MAX };
        self.current_time.set(seconds.clamp(0.0, upper));
    }

    fn duration(&self) -> f64 {
        self.duration.get()
    }

    fn paused(&self) -> bool {
        self.paused.get()
    }

    fn play(&self) {
        self.paused.set(false);
    }

    fn pause(&self) {
        self.paused.set(true);
    }

    fn volume(&self) -> f64 {
        self.volume.get()
    }

    fn set_volume(&self, volume: f64) {
        self.volume.set(volume.clamp(0.0, 1.0));
    }

    fn muted(&self) -> bool {
        self.muted.get()
    }

    fn set_muted(&self, muted: bool) {
        self.muted.set(muted);
    }

    fn playback_rate(&self) -> f64 {
        self.playback_rate.get()
    }

    fn set_playback_rate(&self, rate: f64) {
        self.playback_rate.set(rate);
    }

    fn current_src(&self) -> String {
        self.src.borrow().clone()
    }

    fn video_size(&self) -> (u32, u32) {
        self.video_size.get()
    }

    fn caption_track(&self) -> Option<CaptionTrack> {
        self.caption_track.borrow().clone()
    }

    fn set_caption_mode(&self, mode: CaptionMode) {
        if let Some(track) = self.caption_track.borrow_mut().as_mut() {
            track.mode = mode;
        }
    }

    fn title(&self) -> Option<String> {
        self.title.borrow().clone()
    }
}
