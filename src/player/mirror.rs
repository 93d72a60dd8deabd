//! Derived view state.
//! Everything the controls, menu and about dialog display is recomputed here
//! from the element, the page and the player's own UI state. Recomputing never
//! changes any of its inputs.

use super::context_menu::{InputMethod, MenuPosition};
use super::{PlaybackElement, PlayerAction, PlayerNodes, PlayerState};
use crate::cache::{CacheLookup, MetadataCache};
use crate::host::PageHost;
use crate::player::CaptionMode;
use crate::settings::PlayerSettings;
use crate::utils::{
    derive_mime_from_src, derive_source_label, format_bitrate, format_duration,
    format_file_size, format_playback_rate, format_video_duration, resolve_source_uri,
};

pub const STATUS_FETCHING: &str = "Fetching video metadata…";
pub const STATUS_FAILED: &str = "Unable to retrieve video metadata.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VolumeLevel {
    Muted,
    Low,
    #[default]
    High,
}

impl VolumeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Muted => "muted",
            Self::Low => "low",
            Self::High => "high",
        }
    }
}

/// Most specific display mode wins: PiP, then full screen, then theater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackMode {
    PictureInPicture,
    FullScreen,
    Theater,
    #[default]
    Standard,
}

impl PlaybackMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::PictureInPicture => "Picture-in-Picture",
            Self::FullScreen => "Full Screen",
            Self::Theater => "Theater",
            Self::Standard => "Standard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TechStatus {
    pub message: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuItemView {
    pub action: PlayerAction,
    pub label: String,
    pub shortcut: &'static str,
    pub disabled: bool,
    pub separator_before: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MenuView {
    pub open: bool,
    pub position: MenuPosition,
    pub input_method: InputMethod,
    pub items: Vec<MenuItemView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetaEntry {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModalView {
    pub open: bool,
    pub title: String,
    pub version: String,
    pub description: String,
    pub tech_expanded: bool,
    pub tech_status: TechStatus,
    pub tech_status_visible: bool,
    pub entries: Vec<MetaEntry>,
}

impl ModalView {
    pub fn entry(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.value.as_str())
    }
}

/// Every derived value a player shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabelSet {
    pub paused: bool,
    pub scrubbing: bool,
    pub theater: bool,
    pub full_screen: bool,
    pub mini_player: bool,
    pub captions_showing: bool,
    pub current_time: String,
    pub total_time: String,
    /// Played portion of the timeline, [0, 1]. Follows the drag while scrubbing.
    pub progress: f64,
    /// Hover marker on the timeline, [0, 1].
    pub preview: f64,
    pub preview_image: Option<String>,
    /// Large thumbnail over the video, only while scrubbing.
    pub thumbnail_image: Option<String>,
    pub volume_level: VolumeLevel,
    pub volume_slider: f64,
    pub speed: String,
    pub playback_mode: PlaybackMode,
    pub menu: MenuView,
    pub modal: ModalView,
}

pub struct MirrorInputs<'a> {
    pub element: &'a dyn PlaybackElement,
    pub page: &'a dyn PageHost,
    pub nodes: &'a PlayerNodes,
    pub state: &'a PlayerState,
    pub cache: &'a MetadataCache,
    pub settings: &'a PlayerSettings,
}

fn volume_level(volume: f64, muted: bool) -> VolumeLevel {
    if muted || volume == 0.0 {
        VolumeLevel::Muted
    } else if volume >= 0.5 {
        VolumeLevel::High
    } else {
        VolumeLevel::Low
    }
}

fn playback_mode(pip: bool, full_screen: bool, theater: bool) -> PlaybackMode {
    if pip {
        PlaybackMode::PictureInPicture
    } else if full_screen {
        PlaybackMode::FullScreen
    } else if theater {
        PlaybackMode::Theater
    } else {
        PlaybackMode::Standard
    }
}

fn tech_status(lookup: &CacheLookup) -> TechStatus {
    match lookup {
        CacheLookup::Pending => TechStatus {
            message: STATUS_FETCHING.to_string(),
            is_error: false,
        },
        CacheLookup::Failed => TechStatus {
            message: STATUS_FAILED.to_string(),
            is_error: true,
        },
        CacheLookup::Unknown | CacheLookup::Ready { .. } => TechStatus::default(),
    }
}

fn file_size_label(lookup: &CacheLookup) -> String {
    match lookup {
        CacheLookup::Unknown => "Unknown".to_string(),
        CacheLookup::Pending => "Fetching…".to_string(),
        CacheLookup::Failed => "Unavailable".to_string(),
        CacheLookup::Ready {
            byte_size: Some(bytes),
            ..
        } => format_file_size(*bytes as f64),
        CacheLookup::Ready { byte_size: None, .. } => "Unknown".to_string(),
    }
}

fn bitrate_label(lookup: &CacheLookup, duration: f64) -> String {
    match lookup {
        CacheLookup::Unknown => "Unknown".to_string(),
        CacheLookup::Pending => "Calculating…".to_string(),
        CacheLookup::Failed => "Unavailable".to_string(),
        CacheLookup::Ready {
            byte_size: Some(bytes),
            ..
        } if duration.is_finite() && duration > 0.0 => {
            format_bitrate(*bytes as f64 * 8.0 / duration)
        }
        CacheLookup::Ready { .. } => "Unknown".to_string(),
    }
}

fn menu_label(
    action: PlayerAction,
    element: &dyn PlaybackElement,
    page: &dyn PageHost,
    nodes: &PlayerNodes,
    theater: bool,
    settings: &PlayerSettings,
) -> (String, bool) {
    match action {
        PlayerAction::TogglePlay => {
            let label = if element.paused() { "Play" } else { "Pause" };
            (label.to_string(), false)
        }
        PlayerAction::ToggleMute => {
            let label = if element.muted() || element.volume() == 0.0 {
                "Unmute"
            } else {
                "Mute"
            };
            (label.to_string(), false)
        }
        PlayerAction::ChangeSpeed => (
            format!(
                "Playback Speed {}",
                format_playback_rate(element.playback_rate())
            ),
            false,
        ),
        PlayerAction::ToggleCaptions => match element.caption_track() {
            None => ("Captions Unavailable".to_string(), true),
            Some(track) if track.mode == CaptionMode::Showing => {
                ("Turn Off Captions".to_string(), false)
            }
            Some(_) => ("Turn On Captions".to_string(), false),
        },
        PlayerAction::ToggleTheater => {
            let label = if theater {
                "Exit Theater Mode"
            } else {
                "Enter Theater Mode"
            };
            (label.to_string(), false)
        }
        PlayerAction::ToggleFullScreen => {
            let label = if page.fullscreen_element().as_ref() == Some(&nodes.container) {
                "Exit Full Screen"
            } else {
                "Enter Full Screen"
            };
            (label.to_string(), false)
        }
        PlayerAction::ToggleMiniPlayer => {
            if !page.picture_in_picture_supported() {
                ("Picture-in-Picture Unavailable".to_string(), true)
            } else if page.picture_in_picture_element().as_ref() == Some(&nodes.video) {
                ("Exit Picture-in-Picture".to_string(), false)
            } else {
                ("Enter Picture-in-Picture".to_string(), false)
            }
        }
        PlayerAction::SeekBackward => ("Rewind".to_string(), false),
        PlayerAction::SeekForward => ("Fast Forward".to_string(), false),
        PlayerAction::ShowAbout => (format!("About {}", settings.player_name), false),
    }
}

fn description(
    element: &dyn PlaybackElement,
    page: &dyn PageHost,
    settings: &PlayerSettings,
) -> String {
    let title = element
        .title()
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| page.document_title());
    let watching = if title.is_empty() {
        "this session".to_string()
    } else {
        format!("\"{title}\"")
    };
    format!(
        "You are watching {watching} using {} v{}, our custom HTML5 experience featuring \
         keyboard shortcuts, theater view, picture-in-picture, and fine-grained controls.",
        settings.player_name, settings.player_version
    )
}

/// Recompute every label for one player.
pub fn recompute(inputs: &MirrorInputs<'_>) -> LabelSet {
    let MirrorInputs {
        element,
        page,
        nodes,
        state,
        cache,
        settings,
    } = *inputs;

    let current = element.current_time();
    let duration = element.duration();
    let duration_known = duration.is_finite() && duration > 0.0;
    let volume = element.volume();
    let muted = element.muted();
    let rate = element.playback_rate();
    let track = element.caption_track();

    let pip = page.picture_in_picture_element().as_ref() == Some(&nodes.video);
    let full_screen = page.fullscreen_element().as_ref() == Some(&nodes.container);
    let mode = playback_mode(pip, full_screen, state.theater);

    let progress = match state.scrub.fraction() {
        Some(fraction) => fraction,
        None if duration_known => (current / duration).clamp(0.0, 1.0),
        None => 0.0,
    };
    let preview_image = settings.preview_image(state.preview_fraction, duration);
    let thumbnail_image = if state.scrub.is_scrubbing() {
        preview_image.clone()
    } else {
        None
    };

    let items = PlayerAction::MENU
        .iter()
        .map(|&action| {
            let (label, disabled) =
                menu_label(action, element, page, nodes, state.theater, settings);
            MenuItemView {
                action,
                label,
                shortcut: action.shortcut_hint(),
                disabled,
                separator_before: action.starts_menu_group(),
            }
        })
        .collect();

    let raw_src = element.current_src();
    let base_url = page.base_url();
    let resolved_src = resolve_source_uri(&raw_src, &base_url);
    let lookup = cache.lookup(&resolved_src);
    let status = tech_status(&lookup);

    let mime = match &lookup {
        CacheLookup::Ready { content_type, .. } if !content_type.is_empty() => {
            content_type.clone()
        }
        _ => {
            let derived = derive_mime_from_src(&raw_src);
            if derived.is_empty() {
                "Unknown".to_string()
            } else {
                derived
            }
        }
    };
    let resolution = match element.video_size() {
        (width, height) if width > 0 && height > 0 => format!("{width} × {height}"),
        _ => "Pending".to_string(),
    };
    let volume_label = format!(
        "{}%{}",
        (volume * 100.0).round(),
        if muted { " (Muted)" } else { "" }
    );
    let captions_label = match &track {
        None => "Unavailable".to_string(),
        Some(track) if track.mode == CaptionMode::Showing => {
            format!("On ({})", track.display_name())
        }
        Some(track) => format!("Off ({})", track.display_name()),
    };

    let entries = vec![
        MetaEntry {
            label: "Video Source",
            value: derive_source_label(&raw_src, &base_url),
        },
        MetaEntry {
            label: "MIME Type",
            value: mime,
        },
        MetaEntry {
            label: "File Size",
            value: file_size_label(&lookup),
        },
        MetaEntry {
            label: "Average Bitrate",
            value: bitrate_label(&lookup, duration),
        },
        MetaEntry {
            label: "Duration",
            value: format_video_duration(duration),
        },
        MetaEntry {
            label: "Current Position",
            value: format_video_duration(current),
        },
        MetaEntry {
            label: "Resolution",
            value: resolution,
        },
        MetaEntry {
            label: "Playback Speed",
            value: format_playback_rate(rate),
        },
        MetaEntry {
            label: "Volume",
            value: volume_label,
        },
        MetaEntry {
            label: "Captions",
            value: captions_label,
        },
        MetaEntry {
            label: "Playback Mode",
            value: mode.label().to_string(),
        },
    ];

    let level = volume_level(volume, muted);
    LabelSet {
        paused: element.paused(),
        scrubbing: state.scrub.is_scrubbing(),
        theater: state.theater,
        full_screen,
        mini_player: pip,
        captions_showing: track
            .as_ref()
            .is_some_and(|track| track.mode == CaptionMode::Showing),
        current_time: format_duration(current),
        total_time: format_video_duration(duration),
        progress,
        preview: state.preview_fraction,
        preview_image,
        thumbnail_image,
        volume_level: level,
        volume_slider: if level == VolumeLevel::Muted { 0.0 } else { volume },
        speed: format_playback_rate(rate),
        playback_mode: mode,
        menu: MenuView {
            open: state.menu.open,
            position: state.menu.position,
            input_method: state.menu.input_method,
            items,
        },
        modal: ModalView {
            open: state.modal_open,
            title: settings.player_name.clone(),
            version: format!("v{}", settings.player_version),
            description: description(element, page, settings),
            tech_expanded: state.tech_panel_expanded,
            tech_status_visible: !status.message.is_empty() && state.tech_panel_expanded,
            tech_status: status,
            entries,
        },
    }
}
