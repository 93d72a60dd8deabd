use super::PlayerAction;
use crate::host::ElementKind;

/// Map a key press inside the player to an action.
///
/// Nothing fires while an input has focus. Space and `k` share the play
/// toggle, except that space on a focused button is left to the button.
pub fn shortcut_for(key: &str, focused: ElementKind) -> Option<PlayerAction> {
    if focused == ElementKind::Input {
        return None;
    }
    match key.to_lowercase().as_str() {
        pressed @ (" " | "k") => {
            if pressed == " " && focused == ElementKind::Button {
                return None;
            }
            Some(PlayerAction::TogglePlay)
        }
        "f" => Some(PlayerAction::ToggleFullScreen),
        "t" => Some(PlayerAction::ToggleTheater),
        "i" => Some(PlayerAction::ToggleMiniPlayer),
        "m" => Some(PlayerAction::ToggleMute),
        "arrowleft" | "j" => Some(PlayerAction::SeekBackward),
        "arrowright" | "l" => Some(PlayerAction::SeekForward),
        "c" => Some(PlayerAction::ToggleCaptions),
        _ => None,
    }
}
