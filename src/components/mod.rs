//! Dioxus shell around the player core.

mod app;
mod video_player;

pub use app::*;
pub use video_player::*;
