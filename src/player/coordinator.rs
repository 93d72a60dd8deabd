//! Input routing for one player.
//! Every pointer, keyboard, media and document event goes through
//! [`PlayerInner::dispatch`], which updates the player's state, commands the
//! element and page, and finally pushes fresh labels.

use super::context_menu::{clamp_menu_position, InputMethod, MenuPosition, MenuTrigger};
use super::focus::FocusManager;
use super::overlay_registry::OverlayKind;
use super::scrub::timeline_fraction;
use super::shortcuts::shortcut_for;
use super::{CaptionMode, PlayerAction, PlayerInner};
use crate::cache::CacheLookup;
use crate::host::{ElementKind, NodeId};
use crate::utils::resolve_source_uri;

#[derive(Debug, Clone, PartialEq)]
pub struct KeyInput {
    pub key: String,
    pub shift: bool,
}

impl KeyInput {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            shift: false,
        }
    }

    pub fn shifted(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            shift: true,
        }
    }
}

/// Lifecycle notifications from the media element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    LoadedData,
    LoadedMetadata,
    TimeUpdate,
    VolumeChange,
    Play,
    Pause,
    EnterPictureInPicture,
    LeavePictureInPicture,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Pointer pressed on the timeline; `primary` is the main button.
    TimelinePointerDown { x: f64, primary: bool },
    TimelinePointerMove { x: f64 },
    DocumentPointerMove { x: f64 },
    DocumentPointerUp { x: f64 },
    /// A control button was clicked.
    Control(PlayerAction),
    VolumeInput(f64),
    VideoClick,
    /// Key pressed while focus is inside the player container.
    ShortcutKey(KeyInput),
    /// Key pressed anywhere in the document.
    DocumentKey(KeyInput),
    ContextMenuRequest { x: f64, y: f64, trigger: MenuTrigger },
    /// Click on the menu; `None` when it missed every item.
    MenuItemClick(Option<PlayerAction>),
    MenuKeyDown,
    MenuPointerActivity,
    DocumentClick { target: Option<NodeId> },
    WindowResize,
    DocumentScroll,
    ModalCloseClick,
    OverlayClick { target: NodeId },
    TechToggleClick,
    FocusIn { target: NodeId },
    Media(MediaEvent),
    FullscreenChange,
}

/// What the shell should do with the native event after dispatch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EventOutcome {
    pub prevent_default: bool,
}

impl EventOutcome {
    pub const PASS: Self = Self {
        prevent_default: false,
    };
    pub const CONSUMED: Self = Self {
        prevent_default: true,
    };
}

impl PlayerInner {
    pub(super) fn dispatch(&self, event: PlayerEvent) -> EventOutcome {
        if self.destroyed.get() {
            return EventOutcome::PASS;
        }
        match event {
            PlayerEvent::TimelinePointerDown { x, primary } => self.begin_scrub(x, primary),
            PlayerEvent::TimelinePointerMove { x } => self.move_preview(x),
            PlayerEvent::DocumentPointerMove { x } => {
                if self.state.borrow().scrub.is_scrubbing() {
                    self.move_preview(x)
                } else {
                    EventOutcome::PASS
                }
            }
            PlayerEvent::DocumentPointerUp { x } => self.finish_scrub(x),
            PlayerEvent::Control(action) => {
                self.perform(action);
                EventOutcome::PASS
            }
            PlayerEvent::VolumeInput(value) => {
                self.element.set_volume(value);
                self.element.set_muted(value == 0.0);
                self.refresh();
                EventOutcome::PASS
            }
            PlayerEvent::VideoClick => {
                self.perform(PlayerAction::TogglePlay);
                EventOutcome::PASS
            }
            PlayerEvent::ShortcutKey(key) => self.handle_shortcut(&key),
            PlayerEvent::DocumentKey(key) => self.handle_document_key(&key),
            PlayerEvent::ContextMenuRequest { x, y, trigger } => {
                self.show_context_menu(x, y, trigger)
            }
            PlayerEvent::MenuItemClick(action) => self.handle_menu_click(action),
            PlayerEvent::MenuKeyDown => {
                self.handle_menu_keyboard();
                EventOutcome::PASS
            }
            PlayerEvent::MenuPointerActivity => {
                self.handle_menu_pointer();
                EventOutcome::PASS
            }
            PlayerEvent::DocumentClick { target } => {
                self.handle_document_click(target.as_ref());
                EventOutcome::PASS
            }
            PlayerEvent::WindowResize | PlayerEvent::DocumentScroll => {
                self.hide_context_menu();
                EventOutcome::PASS
            }
            PlayerEvent::ModalCloseClick => {
                self.close_modal();
                EventOutcome::PASS
            }
            PlayerEvent::OverlayClick { target } => {
                if target == self.nodes.modal_overlay {
                    self.close_modal();
                }
                EventOutcome::PASS
            }
            PlayerEvent::TechToggleClick => {
                self.toggle_tech_panel();
                EventOutcome::PASS
            }
            PlayerEvent::FocusIn { target } => {
                self.keep_focus_in_modal(&target);
                EventOutcome::PASS
            }
            PlayerEvent::Media(media) => {
                self.handle_media(media);
                EventOutcome::PASS
            }
            PlayerEvent::FullscreenChange => {
                self.refresh();
                EventOutcome::PASS
            }
        }
    }

    fn timeline_position(&self, x: f64) -> f64 {
        timeline_fraction(x, self.env.page.bounding_rect(&self.nodes.timeline))
    }

    fn begin_scrub(&self, x: f64, primary: bool) -> EventOutcome {
        if !primary {
            return self.move_preview(x);
        }
        let fraction = self.timeline_position(x);
        let was_playing = !self.element.paused();
        self.element.pause();
        {
            let mut state = self.state.borrow_mut();
            state.scrub.begin(was_playing, fraction);
            state.preview_fraction = fraction;
        }
        log::debug!("{}: scrub started at {fraction:.3}", self.nodes.prefix);
        self.refresh();
        EventOutcome::CONSUMED
    }

    /// Move the hover marker, and the drag position while scrubbing.
    fn move_preview(&self, x: f64) -> EventOutcome {
        let fraction = self.timeline_position(x);
        let scrubbing = {
            let mut state = self.state.borrow_mut();
            state.preview_fraction = fraction;
            state.scrub.track(fraction);
            state.scrub.is_scrubbing()
        };
        self.refresh();
        EventOutcome {
            prevent_default: scrubbing,
        }
    }

    fn finish_scrub(&self, x: f64) -> EventOutcome {
        let fraction = self.timeline_position(x);
        let commit = {
            let mut state = self.state.borrow_mut();
            let commit = state.scrub.finish(fraction);
            if commit.is_some() {
                state.preview_fraction = fraction;
            }
            commit
        };
        let Some(commit) = commit else {
            return EventOutcome::PASS;
        };
        let duration = self.element.duration();
        if duration.is_finite() {
            self.element.set_current_time(commit.fraction * duration);
        }
        if commit.resume {
            self.element.play();
        }
        log::debug!(
            "{}: scrub committed at {:.3} (resume: {})",
            self.nodes.prefix,
            commit.fraction,
            commit.resume
        );
        self.refresh();
        EventOutcome::PASS
    }

    fn perform(&self, action: PlayerAction) {
        let page = self.env.page.as_ref();
        match action {
            PlayerAction::TogglePlay => {
                if self.element.paused() {
                    self.element.play();
                } else {
                    self.element.pause();
                }
            }
            PlayerAction::ToggleMute => self.element.set_muted(!self.element.muted()),
            PlayerAction::ChangeSpeed => self.change_speed(),
            PlayerAction::ToggleCaptions => {
                if let Some(track) = self.element.caption_track() {
                    let mode = match track.mode {
                        CaptionMode::Hidden => CaptionMode::Showing,
                        CaptionMode::Showing => CaptionMode::Hidden,
                    };
                    self.element.set_caption_mode(mode);
                }
            }
            PlayerAction::ToggleTheater => {
                let mut state = self.state.borrow_mut();
                state.theater = !state.theater;
            }
            PlayerAction::ToggleFullScreen => {
                if page.fullscreen_element().as_ref() == Some(&self.nodes.container) {
                    page.exit_fullscreen();
                } else {
                    page.request_fullscreen(&self.nodes.container);
                }
            }
            PlayerAction::ToggleMiniPlayer => {
                if !page.picture_in_picture_supported() {
                    return;
                }
                if page.picture_in_picture_element().as_ref() == Some(&self.nodes.video) {
                    page.exit_picture_in_picture();
                } else {
                    page.request_picture_in_picture(&self.nodes.video);
                }
            }
            PlayerAction::SeekBackward => self.skip(-self.env.settings.seek_step_secs),
            PlayerAction::SeekForward => self.skip(self.env.settings.seek_step_secs),
            PlayerAction::ShowAbout => {
                self.open_modal();
                return;
            }
        }
        self.refresh();
    }

    fn change_speed(&self) {
        let settings = &self.env.settings;
        let mut rate = self.element.playback_rate() + settings.speed_step;
        if rate > settings.max_speed {
            rate = settings.min_speed;
        }
        self.element.set_playback_rate(rate);
    }

    fn skip(&self, seconds: f64) {
        let duration = self.element.duration();
        let target = (self.element.current_time() + seconds).max(0.0);
        let target = if duration.is_finite() {
            target.min(duration)
        } else {
            target
        };
        self.element.set_current_time(target);
    }

    fn handle_shortcut(&self, key: &KeyInput) -> EventOutcome {
        let page = self.env.page.as_ref();
        let focused = page
            .active_element()
            .map(|node| page.element_kind(&node))
            .unwrap_or(ElementKind::Other);
        if let Some(action) = shortcut_for(&key.key, focused) {
            self.perform(action);
        }
        EventOutcome::PASS
    }

    fn handle_document_key(&self, key: &KeyInput) -> EventOutcome {
        let page = self.env.page.as_ref();
        let (modal_open, menu_open) = {
            let state = self.state.borrow();
            (state.modal_open, state.menu.open)
        };
        let focus_within = |scope: &NodeId| {
            page.active_element()
                .is_some_and(|active| page.contains(scope, &active))
        };

        if modal_open {
            if !focus_within(&self.nodes.modal_dialog) {
                return EventOutcome::PASS;
            }
            return match key.key.as_str() {
                "Escape" => {
                    self.close_modal();
                    EventOutcome::CONSUMED
                }
                "Tab" => EventOutcome {
                    prevent_default: FocusManager::trap_tab(
                        page,
                        &self.nodes.modal_dialog,
                        &self.nodes.modal_close,
                        key.shift,
                    ),
                },
                _ => EventOutcome::PASS,
            };
        }

        if !menu_open || key.key != "Escape" || !focus_within(&self.nodes.context_menu) {
            return EventOutcome::PASS;
        }
        self.hide_context_menu();
        page.focus(&self.nodes.video);
        EventOutcome::CONSUMED
    }

    fn show_context_menu(&self, x: f64, y: f64, trigger: MenuTrigger) -> EventOutcome {
        if let Some(other) = self.env.overlays.claim(OverlayKind::ContextMenu, self.id) {
            other.dismiss(OverlayKind::ContextMenu);
        }
        let page = self.env.page.as_ref();
        let input_method = match trigger {
            MenuTrigger::Keyboard => InputMethod::Keyboard,
            MenuTrigger::Pointer => InputMethod::Pointer,
        };
        if trigger == MenuTrigger::Pointer {
            FocusManager::blur_within(page, &self.nodes.context_menu);
        }
        {
            let mut state = self.state.borrow_mut();
            state.menu.open = true;
            state.menu.input_method = input_method;
            state.menu.position = MenuPosition::default();
        }
        self.refresh();

        let size = page.bounding_rect(&self.nodes.context_menu);
        let position = clamp_menu_position(
            x,
            y,
            size.width,
            size.height,
            page.viewport(),
            self.env.settings.viewport_padding,
        );
        self.state.borrow_mut().menu.position = position;
        self.refresh();
        log::debug!(
            "{}: context menu opened by {} at ({}, {})",
            self.nodes.prefix,
            input_method.as_str(),
            position.x,
            position.y
        );

        if trigger == MenuTrigger::Keyboard {
            self.focus_first_menu_item();
        }
        EventOutcome::CONSUMED
    }

    pub(super) fn hide_context_menu(&self) {
        {
            let mut state = self.state.borrow_mut();
            if !state.menu.open {
                return;
            }
            state.menu.open = false;
        }
        self.env
            .overlays
            .release(OverlayKind::ContextMenu, self.id);
        FocusManager::blur_within(self.env.page.as_ref(), &self.nodes.context_menu);
        self.refresh();
    }

    fn focus_first_menu_item(&self) {
        let candidates: Vec<(NodeId, bool)> = self
            .labels
            .borrow()
            .menu
            .items
            .iter()
            .map(|item| (self.nodes.menu_item(item.action), item.disabled))
            .collect();
        FocusManager::focus_first_enabled(self.env.page.as_ref(), candidates);
    }

    fn handle_menu_click(&self, action: Option<PlayerAction>) -> EventOutcome {
        let Some(action) = action else {
            return EventOutcome::PASS;
        };
        let disabled = self
            .labels
            .borrow()
            .menu
            .items
            .iter()
            .any(|item| item.action == action && item.disabled);
        if disabled {
            return EventOutcome::PASS;
        }
        self.perform(action);
        self.hide_context_menu();
        EventOutcome::PASS
    }

    fn handle_menu_keyboard(&self) {
        self.state.borrow_mut().menu.input_method = InputMethod::Keyboard;
        let page = self.env.page.as_ref();
        let inside = page
            .active_element()
            .is_some_and(|active| page.contains(&self.nodes.context_menu, &active));
        if !inside {
            self.focus_first_menu_item();
        }
        self.refresh();
    }

    fn handle_menu_pointer(&self) {
        let previous = std::mem::replace(
            &mut self.state.borrow_mut().menu.input_method,
            InputMethod::Pointer,
        );
        if previous != InputMethod::Pointer {
            FocusManager::blur_within(self.env.page.as_ref(), &self.nodes.context_menu);
            self.refresh();
        }
    }

    fn handle_document_click(&self, target: Option<&NodeId>) {
        if !self.state.borrow().menu.open {
            return;
        }
        let page = self.env.page.as_ref();
        if let Some(target) = target {
            if page.contains(&self.nodes.context_menu, target)
                || page.contains(&self.nodes.container, target)
            {
                return;
            }
        }
        self.hide_context_menu();
    }

    fn open_modal(&self) {
        if self.state.borrow().modal_open {
            return;
        }
        if let Some(other) = self.env.overlays.claim(OverlayKind::Modal, self.id) {
            other.dismiss(OverlayKind::Modal);
        }
        {
            let mut state = self.state.borrow_mut();
            state
                .focus
                .remember(self.env.page.as_ref(), &self.nodes.context_menu);
            state.modal_open = true;
            state.tech_panel_expanded = false;
        }
        log::debug!("{}: about dialog opened", self.nodes.prefix);
        self.refresh();

        let me = self.me.clone();
        self.env.scheduler.after_next_frame(Box::new(move || {
            let Some(player) = me.upgrade() else {
                return;
            };
            if player.destroyed.get() || !player.state.borrow().modal_open {
                return;
            }
            player.env.page.focus(&player.nodes.modal_close);
        }));
    }

    pub(super) fn close_modal(&self) {
        let remembered = {
            let mut state = self.state.borrow_mut();
            if !state.modal_open {
                return;
            }
            state.modal_open = false;
            state.tech_panel_expanded = false;
            state.focus.take_remembered()
        };
        self.env.overlays.release(OverlayKind::Modal, self.id);
        log::debug!("{}: about dialog closed", self.nodes.prefix);
        self.refresh();

        let me = self.me.clone();
        self.env.scheduler.after_next_frame(Box::new(move || {
            let Some(player) = me.upgrade() else {
                return;
            };
            if player.destroyed.get() || player.state.borrow().modal_open {
                return;
            }
            let page = player.env.page.as_ref();
            let target = FocusManager::restoration_target(page, remembered, &player.nodes.video);
            page.focus(&target);
        }));
    }

    fn keep_focus_in_modal(&self, target: &NodeId) {
        if !self.state.borrow().modal_open {
            return;
        }
        FocusManager::redirect_focus_in(
            self.env.page.as_ref(),
            &self.nodes.modal_dialog,
            &self.nodes.modal_close,
            target,
        );
    }

    fn toggle_tech_panel(&self) {
        let expanded = {
            let mut state = self.state.borrow_mut();
            if !state.modal_open {
                return;
            }
            state.tech_panel_expanded = !state.tech_panel_expanded;
            state.tech_panel_expanded
        };
        if expanded {
            self.ensure_tech_metadata();
        }
        self.refresh();
    }

    /// Start (or join) the metadata probe for the current source unless a
    /// success is already cached. Labels refresh once it settles.
    fn ensure_tech_metadata(&self) {
        let key = resolve_source_uri(&self.element.current_src(), &self.env.page.base_url());
        if key.is_empty() {
            return;
        }
        let cache = &self.env.cache;
        if matches!(cache.lookup(&key), CacheLookup::Ready { .. }) {
            return;
        }
        let pending = cache.resolve(&key);
        let me = self.me.clone();
        self.env.scheduler.spawn_local(Box::pin(async move {
            let record = pending.await;
            let Some(player) = me.upgrade() else {
                return;
            };
            if record.is_failed() {
                log::debug!("{}: technical details unavailable", player.nodes.prefix);
            }
            player.refresh();
        }));
    }

    fn handle_media(&self, event: MediaEvent) {
        if event == MediaEvent::LoadedMetadata {
            let wants_metadata = {
                let state = self.state.borrow();
                state.modal_open && state.tech_panel_expanded
            };
            if wants_metadata {
                self.ensure_tech_metadata();
            }
        }
        self.refresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ProbeError, ProbeResponse};
    use crate::cache::CacheLookup;
    use crate::headless::{HeadlessPage, MemoryElement};
    use crate::host::{PageHost, Rect, Viewport};
    use crate::player::{
        LabelSet, PlaybackElement, PlayerEnv, PlayerNodes, VideoPlayer, STATUS_FAILED,
        STATUS_FETCHING,
    };
    use crate::settings::PlayerSettings;
    use crate::testing::{ok_response, settle, ManualScheduler, ScriptedServer};
    use std::cell::RefCell;
    use std::rc::Rc;
    use tokio::task::LocalSet;

    const TEN_MIB: &str = "10485760";

    struct Rig {
        page: Rc<HeadlessPage>,
        scheduler: Rc<ManualScheduler>,
        server: ScriptedServer,
        env: PlayerEnv,
    }

    impl Rig {
        fn new(responses: Vec<Result<ProbeResponse, ProbeError>>) -> Self {
            let page = Rc::new(HeadlessPage::new("https://example.com/watch/"));
            let scheduler = Rc::new(ManualScheduler::default());
            let server = ScriptedServer::new(responses);
            let env = PlayerEnv::new(
                page.clone(),
                scheduler.clone(),
                Box::new(server.clone()),
                PlayerSettings::default(),
            );
            Self {
                page,
                scheduler,
                server,
                env,
            }
        }

        fn player(&self, prefix: &str) -> (VideoPlayer, Rc<MemoryElement>) {
            self.player_with_sink(prefix, |_: &LabelSet| {})
        }

        fn player_with_sink(
            &self,
            prefix: &str,
            sink: impl Fn(&LabelSet) + 'static,
        ) -> (VideoPlayer, Rc<MemoryElement>) {
            let nodes = PlayerNodes::with_prefix(prefix);
            self.page.register_player(&nodes);
            self.page.set_rect(
                &nodes.timeline,
                Rect {
                    x: 100.0,
                    y: 500.0,
                    width: 400.0,
                    height: 10.0,
                },
            );
            self.page.set_rect(
                &nodes.context_menu,
                Rect {
                    x: 0.0,
                    y: 0.0,
                    width: 200.0,
                    height: 300.0,
                },
            );
            let element = Rc::new(MemoryElement::new("media/clip.mp4"));
            element.load_metadata(200.0, 1280, 720);
            let player = VideoPlayer::new(self.env.clone(), nodes, element.clone(), sink);
            (player, element)
        }
    }

    fn file_size(player: &VideoPlayer) -> String {
        player
            .labels()
            .modal
            .entry("File Size")
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn scrubbing_leaves_the_position_alone_until_release() {
        let rig = Rig::new(vec![]);
        let (player, element) = rig.player("p");
        element.set_current_time(10.0);
        element.play();

        let down = player.dispatch(PlayerEvent::TimelinePointerDown {
            x: 300.0,
            primary: true,
        });
        assert!(down.prevent_default);
        assert!(element.paused());
        assert!(player.labels().scrubbing);

        player.dispatch(PlayerEvent::DocumentPointerMove { x: 400.0 });
        assert_eq!(element.current_time(), 10.0);
        assert_eq!(player.labels().progress, 0.75);

        player.dispatch(PlayerEvent::DocumentPointerUp { x: 400.0 });
        assert_eq!(element.current_time(), 150.0);
        assert!(!element.paused());
        assert!(!player.labels().scrubbing);
    }

    #[test]
    fn scrubbing_a_paused_video_keeps_it_paused() {
        let rig = Rig::new(vec![]);
        let (player, element) = rig.player("p");

        player.dispatch(PlayerEvent::TimelinePointerDown {
            x: 100.0,
            primary: true,
        });
        player.dispatch(PlayerEvent::DocumentPointerUp { x: 900.0 });
        assert_eq!(element.current_time(), 200.0);
        assert!(element.paused());
    }

    #[test]
    fn secondary_button_only_moves_the_preview() {
        let rig = Rig::new(vec![]);
        let (player, element) = rig.player("p");
        element.set_current_time(20.0);

        player.dispatch(PlayerEvent::TimelinePointerDown {
            x: 200.0,
            primary: false,
        });
        player.dispatch(PlayerEvent::DocumentPointerUp { x: 200.0 });
        let labels = player.labels();
        assert!(!labels.scrubbing);
        assert_eq!(labels.preview, 0.25);
        assert_eq!(element.current_time(), 20.0);
    }

    #[test]
    fn space_on_a_focused_button_is_left_to_the_button() {
        let rig = Rig::new(vec![]);
        let (player, element) = rig.player("p");

        rig.page.focus(&player.nodes().play_pause);
        player.dispatch(PlayerEvent::ShortcutKey(KeyInput::new(" ")));
        assert!(element.paused());
        player.dispatch(PlayerEvent::ShortcutKey(KeyInput::new("k")));
        assert!(!element.paused());

        rig.page.focus(&player.nodes().video);
        player.dispatch(PlayerEvent::ShortcutKey(KeyInput::new(" ")));
        assert!(element.paused());

        rig.page.focus(&player.nodes().volume_slider);
        player.dispatch(PlayerEvent::ShortcutKey(KeyInput::new("k")));
        assert!(element.paused());
    }

    #[test]
    fn seeking_stays_inside_the_media() {
        let rig = Rig::new(vec![]);
        let (player, element) = rig.player("p");

        player.dispatch(PlayerEvent::ShortcutKey(KeyInput::new("j")));
        assert_eq!(element.current_time(), 0.0);
        element.set_current_time(198.0);
        player.dispatch(PlayerEvent::ShortcutKey(KeyInput::new("ArrowRight")));
        assert_eq!(element.current_time(), 200.0);
        player.dispatch(PlayerEvent::ShortcutKey(KeyInput::new("l")));
        assert_eq!(element.current_time(), 200.0);
        player.dispatch(PlayerEvent::ShortcutKey(KeyInput::new("ArrowLeft")));
        assert_eq!(element.current_time(), 195.0);
    }

    #[test]
    fn speed_wraps_back_to_the_slowest_rate() {
        let rig = Rig::new(vec![]);
        let (player, element) = rig.player("p");
        let mut seen = Vec::new();
        for _ in 0..5 {
            player.dispatch(PlayerEvent::Control(PlayerAction::ChangeSpeed));
            seen.push(player.labels().speed);
        }
        assert_eq!(seen, vec!["1.25×", "1.5×", "1.75×", "2×", "0.25×"]);
        assert_eq!(element.playback_rate(), 0.25);
    }

    #[test]
    fn volume_input_mutes_at_zero() {
        let rig = Rig::new(vec![]);
        let (player, element) = rig.player("p");
        player.dispatch(PlayerEvent::VolumeInput(0.0));
        assert!(element.muted());
        player.dispatch(PlayerEvent::VolumeInput(0.4));
        assert!(!element.muted());
        assert_eq!(player.labels().volume_slider, 0.4);
    }

    #[test]
    fn captions_start_hidden_and_toggle() {
        let rig = Rig::new(vec![]);
        let nodes = PlayerNodes::with_prefix("cc");
        rig.page.register_player(&nodes);
        let element = Rc::new(MemoryElement::new("clip.mp4"));
        element.set_caption_track(Some(crate::player::CaptionTrack {
            mode: CaptionMode::Showing,
            label: "English".to_string(),
            language: "en".to_string(),
        }));
        let player = VideoPlayer::new(rig.env.clone(), nodes, element.clone(), |_: &LabelSet| {});
        assert!(!player.labels().captions_showing);

        player.dispatch(PlayerEvent::ShortcutKey(KeyInput::new("c")));
        assert!(player.labels().captions_showing);
        assert_eq!(player.labels().modal.entry("Captions"), Some("On (English)"));
    }

    #[test]
    fn display_modes_follow_the_page() {
        let rig = Rig::new(vec![]);
        let (player, _) = rig.player("p");

        player.dispatch(PlayerEvent::Control(PlayerAction::ToggleTheater));
        player.dispatch(PlayerEvent::Control(PlayerAction::ToggleFullScreen));
        assert_eq!(player.labels().playback_mode.label(), "Full Screen");

        player.dispatch(PlayerEvent::Control(PlayerAction::ToggleMiniPlayer));
        assert_eq!(player.labels().playback_mode.label(), "Picture-in-Picture");

        player.dispatch(PlayerEvent::Control(PlayerAction::ToggleMiniPlayer));
        player.dispatch(PlayerEvent::Control(PlayerAction::ToggleFullScreen));
        assert_eq!(player.labels().playback_mode.label(), "Theater");
    }

    #[test]
    fn full_screen_moves_between_players() {
        let rig = Rig::new(vec![]);
        let (first, _) = rig.player("a");
        let (second, _) = rig.player("b");
        let toggle = PlayerEvent::Control(PlayerAction::ToggleFullScreen);

        first.dispatch(toggle.clone());
        assert_eq!(rig.page.fullscreen_element(), Some(first.nodes().container.clone()));
        assert!(!second.labels().full_screen);

        second.dispatch(toggle.clone());
        assert_eq!(rig.page.fullscreen_element(), Some(second.nodes().container.clone()));
        assert!(second.labels().full_screen);
        assert_eq!(second.labels().playback_mode.label(), "Full Screen");

        second.dispatch(toggle);
        assert_eq!(rig.page.fullscreen_element(), None);
    }

    #[test]
    fn only_one_context_menu_is_open_across_players() {
        let rig = Rig::new(vec![]);
        let (first, _) = rig.player("a");
        let (second, _) = rig.player("b");
        let request = PlayerEvent::ContextMenuRequest {
            x: 40.0,
            y: 40.0,
            trigger: MenuTrigger::Pointer,
        };

        assert!(first.dispatch(request.clone()).prevent_default);
        second.dispatch(request.clone());
        assert!(!first.is_context_menu_open());
        assert!(second.is_context_menu_open());

        first.dispatch(request);
        assert!(first.is_context_menu_open());
        assert!(!second.is_context_menu_open());
        assert!(!first.labels().menu.items.is_empty());
        assert!(!second.labels().menu.open);
    }

    #[test]
    fn menus_and_modals_are_independent() {
        let rig = Rig::new(vec![]);
        let (first, _) = rig.player("a");
        let (second, _) = rig.player("b");

        first.dispatch(PlayerEvent::Control(PlayerAction::ShowAbout));
        second.dispatch(PlayerEvent::ContextMenuRequest {
            x: 10.0,
            y: 10.0,
            trigger: MenuTrigger::Pointer,
        });
        assert!(first.is_modal_open());
        assert!(second.is_context_menu_open());

        second.dispatch(PlayerEvent::Control(PlayerAction::ShowAbout));
        assert!(!first.is_modal_open());
        assert!(second.is_modal_open());
        assert!(second.is_context_menu_open());
    }

    #[test]
    fn open_modal_swallows_menu_escape() {
        let rig = Rig::new(vec![]);
        let (player, _) = rig.player("p");
        let nodes = player.nodes().clone();
        let first_item = nodes.menu_item(PlayerAction::TogglePlay);

        player.dispatch(PlayerEvent::ContextMenuRequest {
            x: 10.0,
            y: 10.0,
            trigger: MenuTrigger::Keyboard,
        });
        player.dispatch(PlayerEvent::Control(PlayerAction::ShowAbout));
        assert!(player.is_modal_open());
        assert!(player.is_context_menu_open());

        rig.page.note_focus(Some(&first_item));
        let outcome = player.dispatch(PlayerEvent::DocumentKey(KeyInput::new("Escape")));
        assert!(!outcome.prevent_default);
        assert!(player.is_context_menu_open());
        assert!(player.is_modal_open());
        assert_eq!(rig.page.active_element(), Some(first_item));

        rig.page.note_focus(Some(&nodes.modal_close));
        let outcome = player.dispatch(PlayerEvent::DocumentKey(KeyInput::new("Escape")));
        assert!(outcome.prevent_default);
        assert!(!player.is_modal_open());
        assert!(player.is_context_menu_open());
    }

    #[test]
    fn menus_are_kept_inside_the_viewport() {
        let rig = Rig::new(vec![]);
        rig.page.set_viewport(Viewport {
            width: 1280.0,
            height: 720.0,
        });
        let (player, _) = rig.player("p");
        player.dispatch(PlayerEvent::ContextMenuRequest {
            x: 1200.0,
            y: 700.0,
            trigger: MenuTrigger::Pointer,
        });
        let position = player.labels().menu.position;
        assert_eq!(position, MenuPosition { x: 1072.0, y: 412.0 });
    }

    #[test]
    fn keyboard_opened_menu_focuses_the_first_item_and_escape_returns_to_video() {
        let rig = Rig::new(vec![]);
        let (player, _) = rig.player("p");
        let nodes = player.nodes().clone();

        player.dispatch(PlayerEvent::ContextMenuRequest {
            x: 10.0,
            y: 10.0,
            trigger: MenuTrigger::Keyboard,
        });
        assert_eq!(
            rig.page.active_element(),
            Some(nodes.menu_item(PlayerAction::TogglePlay))
        );
        assert_eq!(player.labels().menu.input_method, InputMethod::Keyboard);

        let outcome = player.dispatch(PlayerEvent::DocumentKey(KeyInput::new("Escape")));
        assert!(outcome.prevent_default);
        assert!(!player.is_context_menu_open());
        assert_eq!(rig.page.active_element(), Some(nodes.video));
    }

    #[test]
    fn pointer_activity_drops_keyboard_focus_in_the_menu() {
        let rig = Rig::new(vec![]);
        let (player, _) = rig.player("p");
        let first_item = player.nodes().menu_item(PlayerAction::TogglePlay);

        player.dispatch(PlayerEvent::ContextMenuRequest {
            x: 10.0,
            y: 10.0,
            trigger: MenuTrigger::Keyboard,
        });
        player.dispatch(PlayerEvent::MenuPointerActivity);
        assert_eq!(rig.page.active_element(), None);
        assert_eq!(player.labels().menu.input_method, InputMethod::Pointer);

        player.dispatch(PlayerEvent::MenuKeyDown);
        assert_eq!(rig.page.active_element(), Some(first_item));
        assert_eq!(player.labels().menu.input_method, InputMethod::Keyboard);
    }

    #[test]
    fn disabled_items_ignore_clicks() {
        let rig = Rig::new(vec![]);
        rig.page.set_picture_in_picture_supported(false);
        let (player, _) = rig.player("p");
        player.dispatch(PlayerEvent::ContextMenuRequest {
            x: 10.0,
            y: 10.0,
            trigger: MenuTrigger::Pointer,
        });

        player.dispatch(PlayerEvent::MenuItemClick(Some(PlayerAction::ToggleMiniPlayer)));
        player.dispatch(PlayerEvent::MenuItemClick(None));
        assert!(player.is_context_menu_open());

        player.dispatch(PlayerEvent::MenuItemClick(Some(PlayerAction::ToggleTheater)));
        assert!(!player.is_context_menu_open());
        assert!(player.labels().theater);
    }

    #[test]
    fn outside_clicks_resizes_and_scrolls_close_the_menu() {
        let rig = Rig::new(vec![]);
        let (player, _) = rig.player("p");
        let open = PlayerEvent::ContextMenuRequest {
            x: 10.0,
            y: 10.0,
            trigger: MenuTrigger::Pointer,
        };

        player.dispatch(open.clone());
        player.dispatch(PlayerEvent::DocumentClick {
            target: Some(player.nodes().video.clone()),
        });
        assert!(player.is_context_menu_open());
        player.dispatch(PlayerEvent::DocumentClick { target: None });
        assert!(!player.is_context_menu_open());

        player.dispatch(open.clone());
        player.dispatch(PlayerEvent::WindowResize);
        assert!(!player.is_context_menu_open());

        player.dispatch(open);
        player.dispatch(PlayerEvent::DocumentScroll);
        assert!(!player.is_context_menu_open());
    }

    #[test]
    fn modal_traps_tab_and_restores_focus() {
        let rig = Rig::new(vec![]);
        let (player, _) = rig.player("p");
        let nodes = player.nodes().clone();

        rig.page.focus(&nodes.play_pause);
        player.dispatch(PlayerEvent::Control(PlayerAction::ShowAbout));
        assert_eq!(rig.page.active_element(), Some(nodes.play_pause.clone()));
        rig.scheduler.flush_frames();
        assert_eq!(rig.page.active_element(), Some(nodes.modal_close.clone()));

        let forward = player.dispatch(PlayerEvent::DocumentKey(KeyInput::new("Tab")));
        assert!(!forward.prevent_default);

        let back = player.dispatch(PlayerEvent::DocumentKey(KeyInput::shifted("Tab")));
        assert!(back.prevent_default);
        assert_eq!(rig.page.active_element(), Some(nodes.tech_toggle.clone()));

        let wrap = player.dispatch(PlayerEvent::DocumentKey(KeyInput::new("Tab")));
        assert!(wrap.prevent_default);
        assert_eq!(rig.page.active_element(), Some(nodes.modal_close.clone()));

        player.dispatch(PlayerEvent::DocumentKey(KeyInput::new("Escape")));
        assert!(!player.is_modal_open());
        rig.scheduler.flush_frames();
        assert_eq!(rig.page.active_element(), Some(nodes.play_pause));
    }

    #[test]
    fn removed_focus_target_falls_back_to_the_video() {
        let rig = Rig::new(vec![]);
        let (player, _) = rig.player("p");
        let nodes = player.nodes().clone();

        rig.page.focus(&nodes.mute);
        player.dispatch(PlayerEvent::Control(PlayerAction::ShowAbout));
        rig.scheduler.flush_frames();
        rig.page.remove(&nodes.mute);
        player.dispatch(PlayerEvent::ModalCloseClick);
        rig.scheduler.flush_frames();
        assert_eq!(rig.page.active_element(), Some(nodes.video));
    }

    #[test]
    fn escape_outside_the_dialog_is_ignored() {
        let rig = Rig::new(vec![]);
        let (player, _) = rig.player("p");
        let nodes = player.nodes().clone();

        player.dispatch(PlayerEvent::Control(PlayerAction::ShowAbout));
        rig.page.note_focus(Some(&nodes.container));
        player.dispatch(PlayerEvent::DocumentKey(KeyInput::new("Escape")));
        assert!(player.is_modal_open());

        player.dispatch(PlayerEvent::FocusIn {
            target: nodes.container.clone(),
        });
        assert_eq!(rig.page.active_element(), Some(nodes.modal_close.clone()));

        player.dispatch(PlayerEvent::OverlayClick {
            target: nodes.modal_dialog.clone(),
        });
        assert!(player.is_modal_open());
        player.dispatch(PlayerEvent::OverlayClick {
            target: nodes.modal_overlay,
        });
        assert!(!player.is_modal_open());
    }

    #[test]
    fn stale_frame_callbacks_check_the_modal_state() {
        let rig = Rig::new(vec![]);
        let (player, _) = rig.player("p");
        let nodes = player.nodes().clone();

        rig.page.focus(&nodes.speed);
        player.dispatch(PlayerEvent::Control(PlayerAction::ShowAbout));
        player.dispatch(PlayerEvent::ModalCloseClick);
        assert_eq!(rig.scheduler.queued_frames(), 2);
        rig.scheduler.flush_frames();
        assert_eq!(rig.page.active_element(), Some(nodes.speed));
    }

    #[test]
    fn about_from_the_menu_returns_focus_to_the_video() {
        let rig = Rig::new(vec![]);
        let (player, _) = rig.player("p");
        let nodes = player.nodes().clone();

        player.dispatch(PlayerEvent::ContextMenuRequest {
            x: 10.0,
            y: 10.0,
            trigger: MenuTrigger::Keyboard,
        });
        player.dispatch(PlayerEvent::MenuItemClick(Some(PlayerAction::ShowAbout)));
        assert!(player.is_modal_open());
        assert!(!player.is_context_menu_open());
        rig.scheduler.flush_frames();

        player.dispatch(PlayerEvent::DocumentKey(KeyInput::new("Escape")));
        rig.scheduler.flush_frames();
        assert_eq!(rig.page.active_element(), Some(nodes.video));
    }

    #[tokio::test]
    async fn technical_details_load_when_the_panel_expands() {
        LocalSet::new()
            .run_until(async {
                let rig = Rig::new(vec![Ok(ok_response(Some(TEN_MIB), Some("video/mp4")))]);
                let history = Rc::new(RefCell::new(Vec::<String>::new()));
                let recorder = history.clone();
                let (player, _) = rig.player_with_sink("p", move |labels: &LabelSet| {
                    let size = labels.modal.entry("File Size").unwrap_or_default().to_string();
                    let mut history = recorder.borrow_mut();
                    if history.last() != Some(&size) {
                        history.push(size);
                    }
                });

                player.dispatch(PlayerEvent::Control(PlayerAction::ShowAbout));
                assert_eq!(rig.server.calls(), 0);

                player.dispatch(PlayerEvent::TechToggleClick);
                let labels = player.labels();
                assert_eq!(labels.modal.entry("Average Bitrate"), Some("Calculating…"));
                assert_eq!(labels.modal.tech_status.message, STATUS_FETCHING);
                assert!(labels.modal.tech_status_visible);

                settle().await;
                let labels = player.labels();
                assert_eq!(labels.modal.entry("File Size"), Some("10 MB"));
                assert_eq!(labels.modal.entry("Average Bitrate"), Some("419.4 Kbps"));
                assert!(!labels.modal.tech_status_visible);
                assert_eq!(
                    *history.borrow(),
                    vec!["Unknown".to_string(), "Fetching…".to_string(), "10 MB".to_string()]
                );
                assert_eq!(rig.server.calls(), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn players_sharing_a_source_share_one_request() {
        LocalSet::new()
            .run_until(async {
                let rig = Rig::new(vec![Ok(ok_response(Some(TEN_MIB), Some("video/mp4")))]);
                let (first, _) = rig.player("a");
                let (second, _) = rig.player("b");

                first.dispatch(PlayerEvent::Control(PlayerAction::ShowAbout));
                first.dispatch(PlayerEvent::TechToggleClick);
                second.dispatch(PlayerEvent::Control(PlayerAction::ShowAbout));
                second.dispatch(PlayerEvent::TechToggleClick);
                assert_eq!(file_size(&second), "Fetching…");

                settle().await;
                assert_eq!(rig.server.calls(), 1);
                assert_eq!(file_size(&second), "10 MB");

                second.dispatch(PlayerEvent::TechToggleClick);
                second.dispatch(PlayerEvent::TechToggleClick);
                assert_eq!(rig.server.calls(), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn failed_lookups_show_unavailable_then_retry() {
        LocalSet::new()
            .run_until(async {
                let rig = Rig::new(vec![
                    Ok(ProbeResponse {
                        status: 503,
                        ..ProbeResponse::default()
                    }),
                    Ok(ok_response(Some(TEN_MIB), None)),
                ]);
                let (player, _) = rig.player("p");
                player.dispatch(PlayerEvent::Control(PlayerAction::ShowAbout));
                player.dispatch(PlayerEvent::TechToggleClick);
                settle().await;

                let labels = player.labels();
                assert_eq!(labels.modal.entry("File Size"), Some("Unavailable"));
                assert_eq!(labels.modal.entry("Average Bitrate"), Some("Unavailable"));
                assert_eq!(labels.modal.tech_status.message, STATUS_FAILED);
                assert!(labels.modal.tech_status.is_error);

                player.dispatch(PlayerEvent::TechToggleClick);
                assert_eq!(rig.server.calls(), 1);
                player.dispatch(PlayerEvent::TechToggleClick);
                assert_eq!(rig.server.calls(), 2);
                assert_eq!(file_size(&player), "Fetching…");

                settle().await;
                let labels = player.labels();
                assert_eq!(labels.modal.entry("File Size"), Some("10 MB"));
                assert_eq!(labels.modal.entry("MIME Type"), Some("video/mp4"));
            })
            .await;
    }

    #[tokio::test]
    async fn new_sources_are_fetched_while_the_panel_is_open() {
        LocalSet::new()
            .run_until(async {
                let rig = Rig::new(vec![
                    Ok(ok_response(Some(TEN_MIB), Some("video/mp4"))),
                    Ok(ok_response(Some("2048"), Some("video/webm"))),
                ]);
                let (player, element) = rig.player("p");
                player.dispatch(PlayerEvent::Control(PlayerAction::ShowAbout));
                player.dispatch(PlayerEvent::TechToggleClick);
                settle().await;

                element.set_src("media/other.webm");
                player.dispatch(PlayerEvent::Media(MediaEvent::LoadedMetadata));
                assert_eq!(rig.server.calls(), 2);
                settle().await;
                assert_eq!(file_size(&player), "2 KB");
            })
            .await;
    }

    #[tokio::test]
    async fn destroying_mid_flight_still_settles_the_cache() {
        LocalSet::new()
            .run_until(async {
                let rig = Rig::new(vec![Ok(ok_response(Some(TEN_MIB), Some("video/mp4")))]);
                let (player, _) = rig.player("p");
                let nodes = player.nodes().clone();
                player.dispatch(PlayerEvent::Control(PlayerAction::ShowAbout));
                player.dispatch(PlayerEvent::TechToggleClick);

                player.destroy();
                assert!(!rig.page.has_node(&nodes.context_menu));
                assert!(!rig.page.has_node(&nodes.modal_overlay));
                assert!(!player.is_modal_open());

                settle().await;
                let key = "https://example.com/watch/media/clip.mp4";
                assert!(matches!(rig.env.cache.lookup(key), CacheLookup::Ready { .. }));
                assert_eq!(file_size(&player), "Fetching…");

                let outcome = player.dispatch(PlayerEvent::ContextMenuRequest {
                    x: 1.0,
                    y: 1.0,
                    trigger: MenuTrigger::Pointer,
                });
                assert!(!outcome.prevent_default);
                assert!(!player.is_context_menu_open());
                assert_eq!(rig.env.overlays.owner(OverlayKind::Modal), None);
            })
            .await;
    }
}
