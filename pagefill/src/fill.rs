/// Default proportion of the scrollable range that must be passed before a scroll-triggered
/// load is requested.
pub const DEFAULT_LOAD_MORE_THRESHOLD: f32 = 0.8;

/// How an auto-fill loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FillOutcome {
    /// The last completely visible position stopped advancing while more data was available:
    /// the viewport is full and further pages are left to scrolling.
    Saturated,
    /// The source reported that no further page exists.
    Exhausted,
}

/// Progress of the initial auto-fill loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FillProgress {
    /// No viewport check has happened yet.
    #[default]
    NotStarted,
    /// At least one check requested a page; `last_visible` is the last completely visible
    /// position observed by that check (`None` when nothing was completely visible).
    InProgress { last_visible: Option<usize> },
    Complete(FillOutcome),
}

impl FillProgress {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    /// Runs one fill check and records its result.
    ///
    /// Returns `true` when another page should be requested.
    pub fn advance(&mut self, has_more: bool, last_visible: Option<usize>) -> bool {
        match decide_fill(has_more, last_visible, *self) {
            FillDecision::LoadMore => {
                *self = Self::InProgress { last_visible };
                true
            }
            FillDecision::Stop(outcome) => {
                *self = Self::Complete(outcome);
                false
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillDecision {
    LoadMore,
    Stop(FillOutcome),
}

/// Decides whether the auto-fill loop should request another page.
///
/// A page is requested while the source has more data and the last completely visible
/// position has moved since the previous check. The first check always counts as movement.
pub fn decide_fill(
    has_more: bool,
    last_visible: Option<usize>,
    progress: FillProgress,
) -> FillDecision {
    match progress {
        FillProgress::Complete(outcome) => FillDecision::Stop(outcome),
        _ if !has_more => FillDecision::Stop(FillOutcome::Exhausted),
        FillProgress::NotStarted => FillDecision::LoadMore,
        FillProgress::InProgress { last_visible: prev } if prev != last_visible => {
            FillDecision::LoadMore
        }
        FillProgress::InProgress { .. } => FillDecision::Stop(FillOutcome::Saturated),
    }
}

/// Observable phase of a sub-list's fill state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FillPhase {
    /// Not attached to a view, or no paginated source.
    Idle,
    /// The auto-fill loop is running.
    FillingInitial,
    /// The viewport was satisfied; only scroll-triggered loading requests pages.
    AwaitingScroll,
    /// The source is exhausted.
    FillComplete,
}

impl FillPhase {
    pub fn of(progress: FillProgress) -> Self {
        match progress {
            FillProgress::NotStarted | FillProgress::InProgress { .. } => Self::FillingInitial,
            FillProgress::Complete(FillOutcome::Saturated) => Self::AwaitingScroll,
            FillProgress::Complete(FillOutcome::Exhausted) => Self::FillComplete,
        }
    }
}

/// Scroll geometry along the sub-list's scroll axis, as reported by the host view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollMetrics {
    /// Current scroll offset.
    pub offset: u32,
    /// Total content size.
    pub range: u32,
    /// Visible size.
    pub extent: u32,
}

impl ScrollMetrics {
    /// The distance the content can scroll (`range - extent`, zero when content underfills).
    pub fn scrollable_range(&self) -> u32 {
        self.range.saturating_sub(self.extent)
    }

    /// Fraction of the scrollable range already scrolled, or `None` when nothing can scroll.
    pub fn scrolled_fraction(&self) -> Option<f32> {
        let range = self.scrollable_range();
        if range == 0 {
            return None;
        }
        Some(self.offset as f32 / range as f32)
    }
}

/// Decides when scrolling close to the end should request another page.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollTrigger {
    threshold: f32,
}

impl ScrollTrigger {
    /// `threshold` is clamped to `0.0..=1.0`.
    pub fn new(threshold: f32) -> Self {
        let threshold = if threshold.is_nan() {
            DEFAULT_LOAD_MORE_THRESHOLD
        } else {
            threshold.clamp(0.0, 1.0)
        };
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// `true` once the offset passes `threshold` of a non-zero scrollable range.
    pub fn should_load(&self, metrics: ScrollMetrics) -> bool {
        let range = metrics.scrollable_range();
        if range == 0 {
            return false;
        }
        metrics.offset as f32 > range as f32 * self.threshold
    }
}

impl Default for ScrollTrigger {
    fn default() -> Self {
        Self::new(DEFAULT_LOAD_MORE_THRESHOLD)
    }
}
