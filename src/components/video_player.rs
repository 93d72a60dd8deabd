use super::PlayerHub;
use dioxus::html::input_data::MouseButton;
use dioxus::prelude::*;
use logicos_player::player::{
    KeyInput, LabelSet, MediaEvent, MenuTrigger, PlayerAction, PlayerEnv, PlayerEvent,
    PlayerNodes, PlaybackElement, VideoPlayer,
};
use std::rc::Rc;

#[cfg(not(target_arch = "wasm32"))]
use super::DesktopHost;
#[cfg(target_arch = "wasm32")]
use logicos_player::web::WebVideoElement;

pub(crate) fn key_input(evt: &KeyboardEvent) -> KeyInput {
    KeyInput {
        key: evt.key().to_string(),
        shift: evt.modifiers().contains(Modifiers::SHIFT),
    }
}

#[cfg(target_arch = "wasm32")]
fn bind_element(nodes: &PlayerNodes, _src: &str, _title: &str) -> Rc<dyn PlaybackElement> {
    Rc::new(WebVideoElement::new(nodes.video.clone()))
}

#[cfg(not(target_arch = "wasm32"))]
fn bind_element(nodes: &PlayerNodes, src: &str, title: &str) -> Rc<dyn PlaybackElement> {
    consume_context::<DesktopHost>().0.bind_player(nodes, src, title)
}

#[cfg(target_arch = "wasm32")]
fn release_element(_nodes: &PlayerNodes) {}

#[cfg(not(target_arch = "wasm32"))]
fn release_element(nodes: &PlayerNodes) {
    consume_context::<DesktopHost>().0.release_player(nodes);
}

#[component]
pub fn VideoPlayerView(
    prefix: String,
    src: String,
    #[props(default)] title: String,
    #[props(default)] captions: String,
) -> Element {
    let labels = use_signal(LabelSet::default);
    let hub = use_hook(|| CopyValue::new(consume_context::<PlayerHub>()));
    let player = use_hook(|| {
        let env = consume_context::<PlayerEnv>();
        let nodes = PlayerNodes::with_prefix(&prefix);
        let element = bind_element(&nodes, &src, &title);
        let player = VideoPlayer::new(env, nodes, element, move |next: &LabelSet| {
            let mut labels = labels;
            labels.set(next.clone());
        });
        hub.read().attach(player.clone());
        CopyValue::new(player)
    });

    {
        let hub = hub.read().clone();
        let player = player.read().clone();
        use_drop(move || {
            hub.detach(player.id());
            player.destroy();
            release_element(player.nodes());
        });
    }

    let send = move |event: PlayerEvent| player.read().dispatch(event);
    let nodes = player.read().nodes().clone();
    let view = labels.read().clone();

    let mut container_class = vec!["video-container"];
    if view.paused {
        container_class.push("paused");
    }
    if view.scrubbing {
        container_class.push("scrubbing");
    }
    if view.theater {
        container_class.push("theater");
    }
    if view.full_screen {
        container_class.push("full-screen");
    }
    if view.mini_player {
        container_class.push("mini-player");
    }
    if view.captions_showing {
        container_class.push("captions");
    }
    let container_class = container_class.join(" ");

    let timeline_style = format!(
        "--preview-position: {}; --progress-position: {};",
        view.preview, view.progress
    );
    let menu_style = if view.menu.open {
        format!("left: {}px; top: {}px;", view.menu.position.x, view.menu.position.y)
    } else {
        "visibility: hidden;".to_string()
    };
    let play_label = if view.paused { "Play" } else { "Pause" };
    let volume_label = view.volume_level.as_str();
    let menu_items: Vec<_> = view
        .menu
        .items
        .iter()
        .map(|item| (item.clone(), item.action.key(), nodes.menu_item(item.action)))
        .collect();
    let modal = view.modal.clone();
    let tech_status_class = if modal.tech_status.is_error {
        "tech-status error"
    } else {
        "tech-status"
    };

    // On desktop the bridge reports media events together with the element state.
    let media = move |event: MediaEvent| {
        move |_: Event<MediaData>| {
            if cfg!(target_arch = "wasm32") {
                send(PlayerEvent::Media(event));
            }
        }
    };

    let control = move |action: PlayerAction| {
        move |_: MouseEvent| {
            send(PlayerEvent::Control(action));
        }
    };

    rsx! {
        div {
            id: "{nodes.container}",
            class: "{container_class}",
            "data-volume-level": volume_label,
            tabindex: "0",
            onkeydown: move |evt: KeyboardEvent| {
                if send(PlayerEvent::ShortcutKey(key_input(&evt))).prevent_default {
                    evt.prevent_default();
                }
            },
            oncontextmenu: move |evt: MouseEvent| {
                let point = evt.client_coordinates();
                let trigger = match evt.trigger_button() {
                    Some(MouseButton::Primary) => MenuTrigger::Keyboard,
                    _ => MenuTrigger::Pointer,
                };
                let request = PlayerEvent::ContextMenuRequest {
                    x: point.x,
                    y: point.y,
                    trigger,
                };
                if send(request).prevent_default {
                    evt.prevent_default();
                }
            },
            onclick: {
                let container = nodes.container.clone();
                move |_| hub.read().note_click(container.clone())
            },

            if let Some(thumbnail) = view.thumbnail_image.clone() {
                img { class: "thumbnail-img", src: "{thumbnail}" }
            }

            div { class: "video-controls-container",
                div {
                    id: "{nodes.timeline}",
                    "data-bridge-rect": "true",
                    class: "timeline-container",
                    onpointerdown: move |evt: PointerEvent| {
                        let primary = matches!(evt.trigger_button(), Some(MouseButton::Primary));
                        let x = evt.client_coordinates().x;
                        if send(PlayerEvent::TimelinePointerDown { x, primary }).prevent_default {
                            evt.prevent_default();
                        }
                    },
                    onpointermove: move |evt: PointerEvent| {
                        send(PlayerEvent::TimelinePointerMove { x: evt.client_coordinates().x });
                    },
                    div { class: "timeline", style: "{timeline_style}",
                        if let Some(preview) = view.preview_image.clone() {
                            img { class: "preview-img", src: "{preview}" }
                        }
                        div { class: "thumb-indicator" }
                    }
                }

                div { class: "controls",
                    button {
                        id: "{nodes.play_pause}",
                        class: "play-pause-btn",
                        title: "{play_label} (k)",
                        onclick: control(PlayerAction::TogglePlay),
                        "{play_label}"
                    }
                    div { class: "volume-container",
                        button {
                            id: "{nodes.mute}",
                            class: "mute-btn",
                            title: "Mute (m)",
                            onclick: control(PlayerAction::ToggleMute),
                            "{volume_label}"
                        }
                        input {
                            id: "{nodes.volume_slider}",
                            class: "volume-slider",
                            r#type: "range",
                            min: "0",
                            max: "1",
                            step: "any",
                            value: "{view.volume_slider}",
                            oninput: move |evt| {
                                if let Ok(volume) = evt.value().parse::<f64>() {
                                    send(PlayerEvent::VolumeInput(volume));
                                }
                            },
                        }
                    }
                    div { class: "duration-container",
                        span { class: "current-time", "{view.current_time}" }
                        " / "
                        span { class: "total-time", "{view.total_time}" }
                    }
                    button {
                        id: "{nodes.captions}",
                        class: "captions-btn",
                        title: "Captions (c)",
                        onclick: control(PlayerAction::ToggleCaptions),
                        "CC"
                    }
                    button {
                        id: "{nodes.speed}",
                        class: "speed-btn wide-btn",
                        title: "Playback speed",
                        onclick: control(PlayerAction::ChangeSpeed),
                        "{view.speed}"
                    }
                    button {
                        id: "{nodes.mini_player}",
                        class: "mini-player-btn",
                        title: "Mini player (i)",
                        onclick: control(PlayerAction::ToggleMiniPlayer),
                        "PiP"
                    }
                    button {
                        id: "{nodes.theater}",
                        class: "theater-btn",
                        title: "Theater mode (t)",
                        onclick: control(PlayerAction::ToggleTheater),
                        "Theater"
                    }
                    button {
                        id: "{nodes.full_screen}",
                        class: "full-screen-btn",
                        title: "Full screen (f)",
                        onclick: control(PlayerAction::ToggleFullScreen),
                        "Full"
                    }
                }
            }

            video {
                id: "{nodes.video}",
                src: "{src}",
                "data-video-title": "{title}",
                onclick: move |_| {
                    send(PlayerEvent::VideoClick);
                },
                onloadeddata: media(MediaEvent::LoadedData),
                onloadedmetadata: media(MediaEvent::LoadedMetadata),
                ontimeupdate: media(MediaEvent::TimeUpdate),
                onvolumechange: media(MediaEvent::VolumeChange),
                onplay: media(MediaEvent::Play),
                onpause: media(MediaEvent::Pause),
                if !captions.is_empty() {
                    track { kind: "captions", srclang: "en", label: "English", src: "{captions}" }
                }
            }
        }

        div {
            id: "{nodes.context_menu}",
            "data-bridge-rect": "true",
            class: "context-menu",
            role: "menu",
            style: "{menu_style}",
            "data-input-method": view.menu.input_method.as_str(),
            onclick: {
                let menu = nodes.context_menu.clone();
                move |_| hub.read().note_click(menu.clone())
            },
            onkeydown: move |_| {
                send(PlayerEvent::MenuKeyDown);
            },
            onpointermove: move |_| {
                send(PlayerEvent::MenuPointerActivity);
            },
            onpointerdown: move |_| {
                send(PlayerEvent::MenuPointerActivity);
            },
            onwheel: move |_| {
                send(PlayerEvent::MenuPointerActivity);
            },
            for (item, item_key, item_id) in menu_items {
                button {
                    key: "{item_key}",
                    id: "{item_id}",
                    class: if item.separator_before {
                        "context-menu-item group-start"
                    } else {
                        "context-menu-item"
                    },
                    role: "menuitem",
                    disabled: item.disabled,
                    onclick: move |_| {
                        send(PlayerEvent::MenuItemClick(Some(item.action)));
                    },
                    span { class: "context-menu-label", "{item.label}" }
                    if !item.shortcut.is_empty() {
                        span { class: "context-menu-shortcut", "{item.shortcut}" }
                    }
                }
            }
        }

        div {
            id: "{nodes.modal_overlay}",
            class: if modal.open { "about-overlay open" } else { "about-overlay" },
            hidden: !modal.open,
            onclick: {
                let overlay = nodes.modal_overlay.clone();
                move |_| {
                    let target = hub.read().pending_click().unwrap_or_else(|| overlay.clone());
                    send(PlayerEvent::OverlayClick { target });
                }
            },
            div {
                id: "{nodes.modal_dialog}",
                class: "about-dialog",
                role: "dialog",
                "aria-modal": "true",
                onclick: {
                    let dialog = nodes.modal_dialog.clone();
                    move |_| hub.read().note_click(dialog.clone())
                },
                button {
                    id: "{nodes.modal_close}",
                    class: "about-close",
                    "aria-label": "Close",
                    onclick: move |_| {
                        send(PlayerEvent::ModalCloseClick);
                    },
                    "×"
                }
                h2 { class: "about-title", "{modal.title}" }
                p { class: "about-version", "Version {modal.version}" }
                p { class: "about-description", "{modal.description}" }
                button {
                    id: "{nodes.tech_toggle}",
                    class: "tech-toggle",
                    "aria-expanded": if modal.tech_expanded { "true" } else { "false" },
                    "aria-controls": "{nodes.tech_panel}",
                    onclick: move |_| {
                        send(PlayerEvent::TechToggleClick);
                    },
                    "Technical details"
                }
                div {
                    id: "{nodes.tech_panel}",
                    class: "tech-panel",
                    hidden: !modal.tech_expanded,
                    if modal.tech_status_visible {
                        p { class: "{tech_status_class}", "{modal.tech_status.message}" }
                    }
                    dl { class: "tech-entries",
                        for entry in modal.entries.clone() {
                            div { key: "{entry.label}", class: "tech-entry",
                                dt { "{entry.label}" }
                                dd { "{entry.value}" }
                            }
                        }
                    }
                }
            }
        }
    }
}
