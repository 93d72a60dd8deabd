use crate::host::Rect;

/// Timeline drag state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ScrubState {
    #[default]
    Idle,
    Scrubbing {
        /// Playback was running when the drag started.
        resume_after: bool,
        fraction: f64,
    },
}

/// Where a finished drag lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrubCommit {
    pub fraction: f64,
    pub resume: bool,
}

impl ScrubState {
    pub fn is_scrubbing(&self) -> bool {
        matches!(self, Self::Scrubbing { .. })
    }

    pub fn fraction(&self) -> Option<f64> {
        match self {
            Self::Scrubbing { fraction, .. } => Some(*fraction),
            Self::Idle => None,
        }
    }

    pub fn begin(&mut self, was_playing: bool, fraction: f64) {
        *self = Self::Scrubbing {
            resume_after: was_playing,
            fraction,
        };
    }

    /// Move the preview; ignored while idle.
    pub fn track(&mut self, to: f64) {
        if let Self::Scrubbing { fraction, .. } = self {
            *fraction = to;
        }
    }

    pub fn finish(&mut self, at: f64) -> Option<ScrubCommit> {
        match std::mem::take(self) {
            Self::Scrubbing { resume_after, .. } => Some(ScrubCommit {
                fraction: at,
                resume: resume_after,
            }),
            Self::Idle => None,
        }
    }
}

/// Horizontal pointer position as a fraction of the timeline, clamped to [0, 1].
pub fn timeline_fraction(pointer_x: f64, timeline: Rect) -> f64 {
    if timeline.width.is_nan() || timeline.width <= 0.0 || !pointer_x.is_finite() {
        return 0.0;
    }
    (pointer_x - timeline.x).clamp(0.0, timeline.width) / timeline.width
}
