use crate::components::VideoPlayerView;
use dioxus::prelude::*;
use logicos_player::api::HttpProbe;
use logicos_player::host::{NodeId, PageHost, Scheduler};
use logicos_player::player::{EventOutcome, PlayerEnv, PlayerEvent, PlayerId, VideoPlayer};
use logicos_player::settings::PlayerSettings;
use std::cell::RefCell;
use std::rc::Rc;

#[cfg(not(target_arch = "wasm32"))]
use dioxus::core::spawn_forever;
#[cfg(not(target_arch = "wasm32"))]
use futures_util::future::LocalBoxFuture;
#[cfg(not(target_arch = "wasm32"))]
use logicos_player::bridge::{
    BridgeDispatch, BridgeMessage, BridgeRoute, DesktopBridge, BRIDGE_JS,
};
#[cfg(target_arch = "wasm32")]
use logicos_player::web::{attach_page_listeners, BrowserScheduler, WebPage};

const PLAYER_CSS: Asset = asset!("/assets/styling/player.css");

/// Mounted players, so page-level events reach every one of them.
#[derive(Clone, Default)]
pub struct PlayerHub {
    players: Rc<RefCell<Vec<VideoPlayer>>>,
    click_target: Rc<RefCell<Option<NodeId>>>,
}

impl PlayerHub {
    pub fn attach(&self, player: VideoPlayer) {
        self.players.borrow_mut().push(player);
    }

    pub fn detach(&self, id: PlayerId) {
        self.players.borrow_mut().retain(|player| player.id() != id);
    }

    /// Record the innermost identified node a click bubbled through.
    pub fn note_click(&self, node: NodeId) {
        let mut target = self.click_target.borrow_mut();
        if target.is_none() {
            *target = Some(node);
        }
    }

    pub fn pending_click(&self) -> Option<NodeId> {
        self.click_target.borrow().clone()
    }

    fn take_click(&self) -> Option<NodeId> {
        self.click_target.borrow_mut().take()
    }

    pub fn broadcast(&self, event: PlayerEvent) -> EventOutcome {
        let players = self.players.borrow().clone();
        let mut outcome = EventOutcome::PASS;
        for player in players {
            outcome.prevent_default |= player.dispatch(event.clone()).prevent_default;
        }
        outcome
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn route(&self, dispatch: BridgeDispatch) {
        match dispatch.route {
            BridgeRoute::AllPlayers => {
                self.broadcast(dispatch.event);
            }
            BridgeRoute::Video(video) => {
                let player = self
                    .players
                    .borrow()
                    .iter()
                    .find(|player| player.nodes().video == video)
                    .cloned();
                if let Some(player) = player {
                    player.dispatch(dispatch.event);
                }
            }
        }
    }
}

/// The webview bridge every desktop player binds through.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone)]
pub struct DesktopHost(pub Rc<DesktopBridge>);

#[cfg(not(target_arch = "wasm32"))]
struct ShellScheduler;

#[cfg(not(target_arch = "wasm32"))]
impl Scheduler for ShellScheduler {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        let _ = spawn_forever(task);
    }

    fn after_next_frame(&self, task: Box<dyn FnOnce()>) {
        let _ = spawn_forever(async move { task() });
    }
}

#[component]
pub fn App() -> Element {
    #[cfg(not(target_arch = "wasm32"))]
    let host = use_context_provider(|| {
        DesktopHost(Rc::new(DesktopBridge::new(|script: String| {
            let _ = document::eval(&script);
        })))
    });

    let env = use_context_provider(|| {
        let settings = PlayerSettings::load();
        let probe = Box::new(HttpProbe::new(settings.probe_timeout_secs));
        #[cfg(target_arch = "wasm32")]
        let (page, scheduler): (Rc<dyn PageHost>, Rc<dyn Scheduler>) =
            (Rc::new(WebPage), Rc::new(BrowserScheduler));
        #[cfg(not(target_arch = "wasm32"))]
        let (page, scheduler): (Rc<dyn PageHost>, Rc<dyn Scheduler>) =
            (host.0.page(), Rc::new(ShellScheduler));
        PlayerEnv::new(page, scheduler, probe, settings)
    });
    let hub = use_context_provider(PlayerHub::default);

    #[cfg(target_arch = "wasm32")]
    {
        let hub = hub.clone();
        use_hook(move || {
            attach_page_listeners(move |event| {
                hub.broadcast(event);
            })
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let hub = hub.clone();
        let bridge = host.0.clone();
        use_hook(move || {
            spawn(async move {
                let mut reports = document::eval(BRIDGE_JS);
                while let Ok(message) = reports.recv::<BridgeMessage>().await {
                    if let Some(dispatch) = bridge.apply(message) {
                        hub.route(dispatch);
                    }
                }
                log::warn!("desktop bridge closed");
            });
        });
    }

    let on_pointer_move = {
        let hub = hub.clone();
        move |evt: PointerEvent| {
            let x = evt.client_coordinates().x;
            if hub.broadcast(PlayerEvent::DocumentPointerMove { x }).prevent_default {
                evt.prevent_default();
            }
        }
    };

    let on_pointer_up = {
        let hub = hub.clone();
        move |evt: PointerEvent| {
            let x = evt.client_coordinates().x;
            hub.broadcast(PlayerEvent::DocumentPointerUp { x });
        }
    };

    let on_click = {
        let hub = hub.clone();
        move |_| {
            let target = hub.take_click();
            hub.broadcast(PlayerEvent::DocumentClick { target });
        }
    };

    let on_key_down = {
        let hub = hub.clone();
        move |evt: KeyboardEvent| {
            let key = super::key_input(&evt);
            if hub.broadcast(PlayerEvent::DocumentKey(key)).prevent_default {
                evt.prevent_default();
            }
        }
    };

    // On desktop the bridge reports focus changes itself.
    let on_focus_in = {
        let hub = hub.clone();
        let page = env.page.clone();
        move |_| {
            if !cfg!(target_arch = "wasm32") {
                return;
            }
            if let Some(target) = page.active_element() {
                hub.broadcast(PlayerEvent::FocusIn { target });
            }
        }
    };

    rsx! {
        document::Stylesheet { href: PLAYER_CSS }

        div {
            class: "page",
            onpointermove: on_pointer_move,
            onpointerup: on_pointer_up,
            onclick: on_click,
            onkeydown: on_key_down,
            onfocusin: on_focus_in,

            header { class: "page-header",
                h1 { "{env.settings.player_name}" }
                p { class: "page-subtitle", "Right-click a video for more options." }
            }

            main { class: "page-players",
                VideoPlayerView {
                    prefix: "feature".to_string(),
                    src: "media/masterclass.mp4".to_string(),
                    title: "Masterclass".to_string(),
                    captions: "media/masterclass.vtt".to_string(),
                }
                VideoPlayerView {
                    prefix: "trailer".to_string(),
                    src: "media/trailer.webm".to_string(),
                }
            }
        }
    }
}
