/// Everything a control, shortcut or menu item can ask the player to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerAction {
    TogglePlay,
    ToggleMute,
    ChangeSpeed,
    ToggleCaptions,
    ToggleTheater,
    ToggleFullScreen,
    ToggleMiniPlayer,
    SeekBackward,
    SeekForward,
    ShowAbout,
}

impl PlayerAction {
    /// Context menu entries, top to bottom.
    pub const MENU: [PlayerAction; 8] = [
        PlayerAction::TogglePlay,
        PlayerAction::ToggleMute,
        PlayerAction::ChangeSpeed,
        PlayerAction::ToggleCaptions,
        PlayerAction::ToggleTheater,
        PlayerAction::ToggleFullScreen,
        PlayerAction::ToggleMiniPlayer,
        PlayerAction::ShowAbout,
    ];

    /// Stable identifier used in node ids.
    pub fn key(self) -> &'static str {
        match self {
            Self::TogglePlay => "toggle-play",
            Self::ToggleMute => "toggle-mute",
            Self::ChangeSpeed => "change-speed",
            Self::ToggleCaptions => "toggle-captions",
            Self::ToggleTheater => "toggle-theater",
            Self::ToggleFullScreen => "toggle-full-screen",
            Self::ToggleMiniPlayer => "toggle-mini-player",
            Self::SeekBackward => "seek-backward",
            Self::SeekForward => "seek-forward",
            Self::ShowAbout => "show-about",
        }
    }

    /// Shortcut hint shown next to the menu label.
    pub fn shortcut_hint(self) -> &'static str {
        match self {
            Self::TogglePlay => "K",
            Self::ToggleMute => "M",
            Self::ChangeSpeed => "Shift + >",
            Self::ToggleCaptions => "C",
            Self::ToggleTheater => "T",
            Self::ToggleFullScreen => "F",
            Self::ToggleMiniPlayer => "I",
            Self::SeekBackward => "J",
            Self::SeekForward => "L",
            Self::ShowAbout => "—",
        }
    }

    /// Menu entries preceded by a separator.
    pub fn starts_menu_group(self) -> bool {
        matches!(self, Self::ToggleTheater | Self::ShowAbout)
    }
}
