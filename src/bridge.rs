//! Desktop glue. The webview's DOM cannot be reached from Rust directly, so a
//! script installed with `document::eval` reports media, focus, layout and
//! display-mode changes as [`BridgeMessage`]s. They are mirrored into a
//! [`HeadlessPage`] and one [`MemoryElement`] per video. Commands travel the
//! other way as small scripts run against the element by id.

use crate::headless::{HeadlessPage, MemoryElement};
use crate::host::{ElementKind, NodeId, PageHost, Rect, Viewport};
use crate::player::{
    CaptionMode, CaptionTrack, MediaEvent, PlaybackElement, PlayerEvent, PlayerNodes,
};
use serde::Deserialize;
use std::cell::RefCell;
use std::rc::Rc;

/// Installed once per window. Listeners report through `dioxus.send`; the
/// trailing promise keeps the channel open for the life of the page.
pub const BRIDGE_JS: &str = r#"
const send = (message) => dioxus.send(message);
const idOf = (el) => (el && el !== document.body && el.id ? el.id : null);
const rects = () =>
  Array.from(document.querySelectorAll("[data-bridge-rect]")).map((el) => {
    const r = el.getBoundingClientRect();
    return { id: el.id, x: r.left, y: r.top, width: r.width, height: r.height };
  });
const layout = (cause) =>
  send({
    kind: "layout",
    cause,
    width: window.innerWidth,
    height: window.innerHeight,
    rects: rects(),
  });
const snapshot = (video) => {
  const track = video.textTracks && video.textTracks.length ? video.textTracks[0] : null;
  return {
    current_time: video.currentTime,
    duration: Number.isFinite(video.duration) ? video.duration : null,
    paused: video.paused,
    volume: video.volume,
    muted: video.muted,
    playback_rate: video.playbackRate,
    src: video.currentSrc || video.getAttribute("src") || "",
    width: video.videoWidth,
    height: video.videoHeight,
    caption: track
      ? {
          showing: track.mode === "showing",
          label: track.label || "",
          language: track.language || "",
        }
      : null,
  };
};
send({
  kind: "capabilities",
  picture_in_picture: !!document.pictureInPictureEnabled,
  title: document.title,
  base_url: document.baseURI,
});
const mediaEvents = ["loadeddata", "loadedmetadata", "timeupdate", "volumechange", "play", "pause"];
for (const name of mediaEvents) {
  document.addEventListener(name, (event) => {
    const video = event.target;
    if (!(video instanceof HTMLVideoElement) || !video.id) return;
    send({ kind: "media", id: video.id, event: name, snapshot: snapshot(video) });
  }, true);
}
document.addEventListener("focusin", () =>
  send({ kind: "focus", active: idOf(document.activeElement) }), true);
document.addEventListener("focusout", (event) => {
  if (!event.relatedTarget) send({ kind: "focus", active: null });
}, true);
document.addEventListener("fullscreenchange", () =>
  send({ kind: "fullscreen", element: idOf(document.fullscreenElement) }));
document.addEventListener("enterpictureinpicture", (event) =>
  send({ kind: "picture_in_picture", element: idOf(event.target) }), true);
document.addEventListener("leavepictureinpicture", () =>
  send({ kind: "picture_in_picture", element: null }), true);
window.addEventListener("resize", () => layout("resize"));
document.addEventListener("scroll", () => layout("scroll"), true);
for (const name of ["pointerdown", "keydown", "contextmenu"]) {
  document.addEventListener(name, () => layout("input"), true);
}
layout("input");
await new Promise(() => {});
"#;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaptionSnapshot {
    pub showing: bool,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoSnapshot {
    pub current_time: f64,
    pub duration: Option<f64>,
    pub paused: bool,
    pub volume: f64,
    pub muted: bool,
    pub playback_rate: f64,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    pub caption: Option<CaptionSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackedRect {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BridgeMessage {
    Capabilities {
        picture_in_picture: bool,
        title: String,
        base_url: String,
    },
    Media {
        id: String,
        event: String,
        snapshot: VideoSnapshot,
    },
    Focus {
        active: Option<String>,
    },
    Layout {
        cause: String,
        width: f64,
        height: f64,
        rects: Vec<TrackedRect>,
    },
    Fullscreen {
        element: Option<String>,
    },
    PictureInPicture {
        element: Option<String>,
    },
}

/// Who an event produced by [`DesktopBridge::apply`] is for.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeRoute {
    AllPlayers,
    /// The player bound to this video.
    Video(NodeId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BridgeDispatch {
    pub route: BridgeRoute,
    pub event: PlayerEvent,
}

type ScriptRunner = Rc<dyn Fn(String)>;

/// Script running `body` with `el` bound to the element with this id.
fn on_element(id: &NodeId, body: &str) -> String {
    let id = serde_json::to_string(id.as_str()).unwrap_or_else(|_| "null".to_string());
    format!(
        "(function () {{ const el = document.getElementById({id}); \
         if (!el) return; {body} }})();"
    )
}

fn media_event(name: &str) -> Option<MediaEvent> {
    match name {
        "loadeddata" => Some(MediaEvent::LoadedData),
        "loadedmetadata" => Some(MediaEvent::LoadedMetadata),
        "timeupdate" => Some(MediaEvent::TimeUpdate),
        "volumechange" => Some(MediaEvent::VolumeChange),
        "play" => Some(MediaEvent::Play),
        "pause" => Some(MediaEvent::Pause),
        _ => None,
    }
}

/// `PageHost` answering from the mirrored page and forwarding focus and
/// display-mode requests to the webview.
pub struct BridgedPage {
    mirror: HeadlessPage,
    run: ScriptRunner,
}

impl PageHost for BridgedPage {
    fn active_element(&self) -> Option<NodeId> {
        self.mirror.active_element()
    }

    fn element_kind(&self, node: &NodeId) -> ElementKind {
        self.mirror.element_kind(node)
    }

    fn focus(&self, node: &NodeId) {
        self.mirror.focus(node);
        (self.run)(on_element(node, "el.focus();"));
    }

    fn blur(&self, node: &NodeId) {
        self.mirror.blur(node);
        (self.run)(on_element(node, "el.blur();"));
    }

    fn contains(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        self.mirror.contains(ancestor, node)
    }

    fn is_focusable(&self, node: &NodeId) -> bool {
        self.mirror.is_focusable(node)
    }

    fn focusable_within(&self, scope: &NodeId) -> Vec<NodeId> {
        self.mirror.focusable_within(scope)
    }

    fn bounding_rect(&self, node: &NodeId) -> Rect {
        self.mirror.bounding_rect(node)
    }

    fn viewport(&self) -> Viewport {
        self.mirror.viewport()
    }

    // The display-mode getters wait for the document to report the change.
    fn fullscreen_element(&self) -> Option<NodeId> {
        self.mirror.fullscreen_element()
    }

    fn request_fullscreen(&self, node: &NodeId) {
        (self.run)(on_element(
            node,
            "if (el.requestFullscreen) el.requestFullscreen().catch(() => {});",
        ));
    }

    fn exit_fullscreen(&self) {
        (self.run)(
            "if (document.fullscreenElement) document.exitFullscreen().catch(() => {});"
                .to_string(),
        );
    }

    fn picture_in_picture_supported(&self) -> bool {
        self.mirror.picture_in_picture_supported()
    }

    fn picture_in_picture_element(&self) -> Option<NodeId> {
        self.mirror.picture_in_picture_element()
    }

    fn request_picture_in_picture(&self, video: &NodeId) {
        (self.run)(on_element(
            video,
            "if (el.requestPictureInPicture) el.requestPictureInPicture().catch(() => {});",
        ));
    }

    fn exit_picture_in_picture(&self) {
        (self.run)(
            "if (document.pictureInPictureElement) document.exitPictureInPicture().catch(() => {});"
                .to_string(),
        );
    }

    fn document_title(&self) -> String {
        self.mirror.document_title()
    }

    fn base_url(&self) -> String {
        self.mirror.base_url()
    }

    // The renderer owns the real nodes; only the mirror forgets them.
    fn detach(&self, node: &NodeId) {
        self.mirror.detach(node);
    }
}

/// A webview `<video>`: reads come from the last reported snapshot, writes
/// update it immediately and are sent to the element.
pub struct BridgedVideo {
    id: NodeId,
    state: MemoryElement,
    run: ScriptRunner,
}

impl BridgedVideo {
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    fn command(&self, body: String) {
        (self.run)(on_element(&self.id, &body));
    }

    fn apply(&self, snapshot: &VideoSnapshot) {
        let state = &self.state;
        state.set_src(&snapshot.src);
        state.load_metadata(
            snapshot.duration.unwrap_or(f64::NAN),
            snapshot.width,
            snapshot.height,
        );
        state.set_current_time(snapshot.current_time);
        if snapshot.paused {
            state.pause();
        } else {
            state.play();
        }
        state.set_volume(snapshot.volume);
        state.set_muted(snapshot.muted);
        state.set_playback_rate(snapshot.playback_rate);
        state.set_caption_track(snapshot.caption.as_ref().map(|caption| CaptionTrack {
            mode: if caption.showing {
                CaptionMode::Showing
            } else {
                CaptionMode::Hidden
            },
            label: caption.label.clone(),
            language: caption.language.clone(),
        }));
    }
}

impl PlaybackElement for BridgedVideo {
    fn current_time(&self) -> f64 {
        self.state.current_time()
    }

    fn set_current_time(&self, seconds: f64) {
        self.state.set_current_time(seconds);
        self.command(format!("el.currentTime = {};", self.state.current_time()));
    }

    fn duration(&self) -> f64 {
        self.state.duration()
    }

    fn paused(&self) -> bool {
        self.state.paused()
    }

    fn play(&self) {
        self.state.play();
        self.command("el.play().catch(() => {});".to_string());
    }

    fn pause(&self) {
        self.state.pause();
        self.command("el.pause();".to_string());
    }

    fn volume(&self) -> f64 {
        self.state.volume()
    }

    fn set_volume(&self, volume: f64) {
        self.state.set_volume(volume);
        self.command(format!("el.volume = {};", self.state.volume()));
    }

    fn muted(&self) -> bool {
        self.state.muted()
    }

    fn set_muted(&self, muted: bool) {
        self.state.set_muted(muted);
        self.command(format!("el.muted = {muted};"));
    }

    fn playback_rate(&self) -> f64 {
        self.state.playback_rate()
    }

    fn set_playback_rate(&self, rate: f64) {
        self.state.set_playback_rate(rate);
        self.command(format!("el.playbackRate = {rate};"));
    }

    fn current_src(&self) -> String {
        self.state.current_src()
    }

    fn video_size(&self) -> (u32, u32) {
        self.state.video_size()
    }

    fn caption_track(&self) -> Option<CaptionTrack> {
        self.state.caption_track()
    }

    fn set_caption_mode(&self, mode: CaptionMode) {
        self.state.set_caption_mode(mode);
        let mode = match mode {
            CaptionMode::Showing => "showing",
            CaptionMode::Hidden => "hidden",
        };
        self.command(format!(
            "const track = el.textTracks && el.textTracks[0]; if (track) track.mode = \"{mode}\";"
        ));
    }

    fn title(&self) -> Option<String> {
        self.state.title()
    }
}

/// Owns the mirrored page and every bound video of one window.
pub struct DesktopBridge {
    page: Rc<BridgedPage>,
    videos: RefCell<Vec<Rc<BridgedVideo>>>,
    run: ScriptRunner,
}

impl DesktopBridge {
    pub fn new(run: impl Fn(String) + 'static) -> Self {
        let run: ScriptRunner = Rc::new(run);
        Self {
            page: Rc::new(BridgedPage {
                mirror: HeadlessPage::default(),
                run: run.clone(),
            }),
            videos: RefCell::new(Vec::new()),
            run,
        }
    }

    pub fn page(&self) -> Rc<BridgedPage> {
        self.page.clone()
    }

    /// Lay out one player's nodes in the mirror and bind its `<video>`.
    pub fn bind_player(&self, nodes: &PlayerNodes, src: &str, title: &str) -> Rc<BridgedVideo> {
        self.page.mirror.register_player(nodes);
        let state = MemoryElement::new(src);
        state.set_title((!title.trim().is_empty()).then_some(title));
        let video = Rc::new(BridgedVideo {
            id: nodes.video.clone(),
            state,
            run: self.run.clone(),
        });
        let mut videos = self.videos.borrow_mut();
        videos.retain(|bound| bound.id != video.id);
        videos.push(video.clone());
        video
    }

    pub fn release_player(&self, nodes: &PlayerNodes) {
        self.videos.borrow_mut().retain(|bound| bound.id != nodes.video);
        self.page.mirror.remove(&nodes.container);
    }

    fn video(&self, id: &NodeId) -> Option<Rc<BridgedVideo>> {
        self.videos.borrow().iter().find(|video| &video.id == id).cloned()
    }

    /// Fold one report into the mirror; returns the player event it amounts to.
    pub fn apply(&self, message: BridgeMessage) -> Option<BridgeDispatch> {
        let mirror = &self.page.mirror;
        let all = |event| {
            Some(BridgeDispatch {
                route: BridgeRoute::AllPlayers,
                event,
            })
        };
        match message {
            BridgeMessage::Capabilities {
                picture_in_picture,
                title,
                base_url,
            } => {
                mirror.set_picture_in_picture_supported(picture_in_picture);
                mirror.set_title(&title);
                mirror.set_base_url(&base_url);
                None
            }
            BridgeMessage::Media {
                id,
                event,
                snapshot,
            } => {
                let id = NodeId::new(id);
                let Some(video) = self.video(&id) else {
                    log::debug!("media event for unbound video {id}");
                    return None;
                };
                video.apply(&snapshot);
                Some(BridgeDispatch {
                    route: BridgeRoute::Video(id),
                    event: PlayerEvent::Media(media_event(&event)?),
                })
            }
            BridgeMessage::Focus { active } => {
                let active = active.map(NodeId::new);
                mirror.note_focus(active.as_ref());
                all(PlayerEvent::FocusIn { target: active? })
            }
            BridgeMessage::Layout {
                cause,
                width,
                height,
                rects,
            } => {
                mirror.set_viewport(Viewport { width, height });
                for tracked in rects {
                    mirror.set_rect(
                        &NodeId::new(tracked.id),
                        Rect {
                            x: tracked.x,
                            y: tracked.y,
                            width: tracked.width,
                            height: tracked.height,
                        },
                    );
                }
                match cause.as_str() {
                    "resize" => all(PlayerEvent::WindowResize),
                    "scroll" => all(PlayerEvent::DocumentScroll),
                    _ => None,
                }
            }
            BridgeMessage::Fullscreen { element } => {
                mirror.set_fullscreen_element(element.map(NodeId::new).as_ref());
                all(PlayerEvent::FullscreenChange)
            }
            BridgeMessage::PictureInPicture { element } => {
                let element = element.map(NodeId::new);
                mirror.set_picture_in_picture_element(element.as_ref());
                let event = if element.is_some() {
                    MediaEvent::EnterPictureInPicture
                } else {
                    MediaEvent::LeavePictureInPicture
                };
                all(PlayerEvent::Media(event))
            }
        }
    }
}
