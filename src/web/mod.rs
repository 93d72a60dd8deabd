//! Browser implementations of the host traits, over `web-sys`.

use crate::host::{ElementKind, NodeId, PageHost, Rect, Scheduler, Viewport};
use crate::player::{CaptionMode, CaptionTrack, MediaEvent, PlaybackElement, PlayerEvent};
use futures_util::future::LocalBoxFuture;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{window, Document, Element, HtmlElement, HtmlVideoElement, TextTrackMode};

const FOCUSABLE_SELECTOR: &str =
    "button, [href], input, select, textarea, [tabindex]:not([tabindex=\"-1\"])";

fn document() -> Option<Document> {
    window()?.document()
}

fn element_by_id(node: &NodeId) -> Option<Element> {
    document()?.get_element_by_id(node.as_str())
}

fn node_of(element: &Element) -> Option<NodeId> {
    let id = element.id();
    if id.is_empty() {
        None
    } else {
        Some(NodeId::new(id))
    }
}

fn js_property(target: &JsValue, name: &str) -> Option<JsValue> {
    js_sys::Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

/// Call a zero-argument method that may return a promise, logging a rejection.
fn call_method(target: &JsValue, name: &str) {
    let Some(method) = js_property(target, name)
        .and_then(|value| value.dyn_into::<js_sys::Function>().ok())
    else {
        return;
    };
    match method.call0(target) {
        Ok(result) => {
            if let Ok(promise) = result.dyn_into::<js_sys::Promise>() {
                let name = name.to_string();
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(err) = wasm_bindgen_futures::JsFuture::from(promise).await {
                        log::warn!("{name} rejected: {err:?}");
                    }
                });
            }
        }
        Err(err) => log::warn!("{name} failed: {err:?}"),
    }
}

/// The live document.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebPage;

impl PageHost for WebPage {
    fn active_element(&self) -> Option<NodeId> {
        let active = document()?.active_element()?;
        node_of(&active)
    }

    fn element_kind(&self, node: &NodeId) -> ElementKind {
        match element_by_id(node).map(|element| element.tag_name().to_lowercase()) {
            Some(tag) if tag == "input" => ElementKind::Input,
            Some(tag) if tag == "button" => ElementKind::Button,
            _ => ElementKind::Other,
        }
    }

    fn focus(&self, node: &NodeId) {
        if let Some(element) = element_by_id(node).and_then(|e| e.dyn_into::<HtmlElement>().ok()) {
            let _ = element.focus();
        }
    }

    fn blur(&self, node: &NodeId) {
        if let Some(element) = element_by_id(node).and_then(|e| e.dyn_into::<HtmlElement>().ok()) {
            let _ = element.blur();
        }
    }

    fn contains(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        match (element_by_id(ancestor), element_by_id(node)) {
            (Some(ancestor), Some(node)) => ancestor.contains(Some(node.as_ref())),
            _ => false,
        }
    }

    fn is_focusable(&self, node: &NodeId) -> bool {
        element_by_id(node).is_some_and(|element| {
            element.is_connected()
                && !element.has_attribute("disabled")
                && element.dyn_ref::<HtmlElement>().is_some()
        })
    }

    fn focusable_within(&self, scope: &NodeId) -> Vec<NodeId> {
        let Some(list) = element_by_id(scope)
            .and_then(|scope| scope.query_selector_all(FOCUSABLE_SELECTOR).ok())
        else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|index| list.item(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .filter(|element| !element.has_attribute("disabled"))
            .filter_map(|element| node_of(&element))
            .collect()
    }

    fn bounding_rect(&self, node: &NodeId) -> Rect {
        element_by_id(node)
            .map(|element| {
                let rect = element.get_bounding_client_rect();
                Rect {
                    x: rect.x(),
                    y: rect.y(),
                    width: rect.width(),
                    height: rect.height(),
                }
            })
            .unwrap_or_default()
    }

    fn viewport(&self) -> Viewport {
        let dimension = |value: Result<JsValue, JsValue>| {
            value.ok().and_then(|value| value.as_f64()).unwrap_or(0.0)
        };
        match window() {
            Some(window) => Viewport {
                width: dimension(window.inner_width()),
                height: dimension(window.inner_height()),
            },
            None => Viewport {
                width: 0.0,
                height: 0.0,
            },
        }
    }

    fn fullscreen_element(&self) -> Option<NodeId> {
        node_of(&document()?.fullscreen_element()?)
    }

    fn request_fullscreen(&self, node: &NodeId) {
        if let Some(element) = element_by_id(node) {
            if let Err(err) = element.request_fullscreen() {
                log::warn!("fullscreen request failed: {err:?}");
            }
        }
    }

    fn exit_fullscreen(&self) {
        if let Some(document) = document() {
            document.exit_fullscreen();
        }
    }

    fn picture_in_picture_supported(&self) -> bool {
        document()
            .and_then(|document| js_property(&document.into(), "pictureInPictureEnabled"))
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    fn picture_in_picture_element(&self) -> Option<NodeId> {
        let document: JsValue = document()?.into();
        let element = js_property(&document, "pictureInPictureElement")?
            .dyn_into::<Element>()
            .ok()?;
        node_of(&element)
    }

    fn request_picture_in_picture(&self, video: &NodeId) {
        if let Some(element) = element_by_id(video) {
            call_method(&element.into(), "requestPictureInPicture");
        }
    }

    fn exit_picture_in_picture(&self) {
        if let Some(document) = document() {
            call_method(&document.into(), "exitPictureInPicture");
        }
    }

    fn document_title(&self) -> String {
        document().map(|document| document.title()).unwrap_or_default()
    }

    fn base_url(&self) -> String {
        document()
            .and_then(|document| document.url().ok())
            .unwrap_or_default()
    }

    fn detach(&self, node: &NodeId) {
        if let Some(element) = element_by_id(node) {
            element.remove();
        }
    }
}

/// A `<video>` looked up by id on every access, so the handle stays valid
/// across re-renders.
#[derive(Debug, Clone)]
pub struct WebVideoElement {
    id: NodeId,
}

impl WebVideoElement {
    pub fn new(id: NodeId) -> Self {
        Self { id }
    }

    fn video(&self) -> Option<HtmlVideoElement> {
        element_by_id(&self.id)?.dyn_into::<HtmlVideoElement>().ok()
    }

    fn first_track(&self) -> Option<web_sys::TextTrack> {
        self.video()?.text_tracks()?.get(0)
    }
}

impl PlaybackElement for WebVideoElement {
    fn current_time(&self) -> f64 {
        self.video().map(|video| video.current_time()).unwrap_or(0.0)
    }

    fn set_current_time(&self, seconds: f64) {
        if let Some(video) = self.video() {
            video.set_current_time(seconds);
        }
    }

    fn duration(&self) -> f64 {
        self.video().map(|video| video.duration()).unwrap_or(f64::NAN)
    }

    fn paused(&self) -> bool {
        self.video().map(|video| video.paused()).unwrap_or(true)
    }

    fn play(&self) {
        let Some(video) = self.video() else {
            return;
        };
        match video.play() {
            Ok(promise) => wasm_bindgen_futures::spawn_local(async move {
                if let Err(err) = wasm_bindgen_futures::JsFuture::from(promise).await {
                    log::warn!("playback did not start: {err:?}");
                }
            }),
            Err(err) => log::warn!("playback did not start: {err:?}"),
        }
    }

    fn pause(&self) {
        if let Some(video) = self.video() {
            let _ = video.pause();
        }
    }

    fn volume(&self) -> f64 {
        self.video().map(|video| video.volume()).unwrap_or(1.0)
    }

    fn set_volume(&self, volume: f64) {
        if let Some(video) = self.video() {
            video.set_volume(volume.clamp(0.0, 1.0));
        }
    }

    fn muted(&self) -> bool {
        self.video().map(|video| video.muted()).unwrap_or(false)
    }

    fn set_muted(&self, muted: bool) {
        if let Some(video) = self.video() {
            video.set_muted(muted);
        }
    }

    fn playback_rate(&self) -> f64 {
        self.video().map(|video| video.playback_rate()).unwrap_or(1.0)
    }

    fn set_playback_rate(&self, rate: f64) {
        if let Some(video) = self.video() {
            video.set_playback_rate(rate);
        }
    }

    fn current_src(&self) -> String {
        let Some(video) = self.video() else {
            return String::new();
        };
        let current = video.current_src();
        if current.is_empty() {
            video.get_attribute("src").unwrap_or_default()
        } else {
            current
        }
    }

    fn video_size(&self) -> (u32, u32) {
        self.video()
            .map(|video| (video.video_width(), video.video_height()))
            .unwrap_or((0, 0))
    }

    fn caption_track(&self) -> Option<CaptionTrack> {
        let track = self.first_track()?;
        let mode = match track.mode() {
            TextTrackMode::Showing => CaptionMode::Showing,
            _ => CaptionMode::Hidden,
        };
        Some(CaptionTrack {
            mode,
            label: track.label(),
            language: track.language(),
        })
    }

    fn set_caption_mode(&self, mode: CaptionMode) {
        if let Some(track) = self.first_track() {
            track.set_mode(match mode {
                CaptionMode::Showing => TextTrackMode::Showing,
                CaptionMode::Hidden => TextTrackMode::Hidden,
            });
        }
    }

    fn title(&self) -> Option<String> {
        self.video()?
            .get_attribute("data-video-title")
            .filter(|title| !title.trim().is_empty())
    }
}

/// Spawns onto the browser's microtask queue; frames go through
/// `requestAnimationFrame`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }

    fn after_next_frame(&self, task: Box<dyn FnOnce()>) {
        let Some(window) = window() else {
            return;
        };
        let callback = Closure::once_into_js(move || task());
        if let Err(err) = window.request_animation_frame(callback.unchecked_ref()) {
            log::warn!("requestAnimationFrame failed: {err:?}");
        }
    }
}

/// Window and document events with no element-level equivalent in the shell.
/// Listeners live for the lifetime of the page.
pub fn attach_page_listeners(dispatch: impl Fn(PlayerEvent) + 'static) {
    let Some(window) = window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };
    let dispatch: Rc<dyn Fn(PlayerEvent)> = Rc::new(dispatch);

    listen(&window, "resize", false, &dispatch, PlayerEvent::WindowResize);
    listen(&document, "scroll", true, &dispatch, PlayerEvent::DocumentScroll);
    listen(&document, "fullscreenchange", false, &dispatch, PlayerEvent::FullscreenChange);
    listen(
        &document,
        "enterpictureinpicture",
        true,
        &dispatch,
        PlayerEvent::Media(MediaEvent::EnterPictureInPicture),
    );
    listen(
        &document,
        "leavepictureinpicture",
        true,
        &dispatch,
        PlayerEvent::Media(MediaEvent::LeavePictureInPicture),
    );
}

fn listen(
    target: &web_sys::EventTarget,
    name: &str,
    capture: bool,
    dispatch: &Rc<dyn Fn(PlayerEvent)>,
    event: PlayerEvent,
) {
    let dispatch = dispatch.clone();
    let callback = Closure::wrap(Box::new(move || dispatch(event.clone())) as Box<dyn FnMut()>);
    let listener = callback.as_ref().unchecked_ref();
    if let Err(err) = target.add_event_listener_with_callback_and_bool(name, listener, capture) {
        log::warn!("could not listen for {name}: {err:?}");
    }
    callback.forget();
}
