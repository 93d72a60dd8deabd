/// Caption visibility of the element's text track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionMode {
    Hidden,
    Showing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptionTrack {
    pub mode: CaptionMode,
    pub label: String,
    pub language: String,
}

impl CaptionTrack {
    /// Track label, then language, then a generic name.
    pub fn display_name(&self) -> &str {
        if !self.label.is_empty() {
            &self.label
        } else if !self.language.is_empty() {
            &self.language
        } else {
            "Track 1"
        }
    }
}

/// The media element a player is bound to. Owned by the page; the player only
/// reads and commands it.
pub trait PlaybackElement {
    fn current_time(&self) -> f64;
    fn set_current_time(&self, seconds: f64);
    /// NaN until metadata has loaded.
    fn duration(&self) -> f64;
    fn paused(&self) -> bool;
    fn play(&self);
    fn pause(&self);
    fn volume(&self) -> f64;
    fn set_volume(&self, volume: f64);
    fn muted(&self) -> bool;
    fn set_muted(&self, muted: bool);
    fn playback_rate(&self) -> f64;
    fn set_playback_rate(&self, rate: f64);
    /// `currentSrc`, falling back to the `src` attribute.
    fn current_src(&self) -> String;
    /// Intrinsic `(width, height)`, zero until known.
    fn video_size(&self) -> (u32, u32);
    fn caption_track(&self) -> Option<CaptionTrack>;
    fn set_caption_mode(&self, mode: CaptionMode);
    /// Title advertised by the page for this video, if any.
    fn title(&self) -> Option<String>;
}
