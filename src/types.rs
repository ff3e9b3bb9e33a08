/// Input of one alignment call: the real recording, the synthesized
/// rendition of the text, and the text fragments themselves.
#[derive(Debug, Clone)]
pub struct AlignmentInput {
    pub sample_rate_hz: u32,
    /// Mono PCM samples of the real recording, in [-1, 1].
    pub samples: Vec<f64>,
    /// Concatenated synthesized waveform at the same sample rate.
    pub synth_samples: Vec<f64>,
    pub fragments: Vec<Fragment>,
}

/// One text fragment, with the synthesized duration reported by the
/// external TTS collaborator. That duration is trusted as ground truth
/// when locating the fragment inside the synthesized feature sequence.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub id: String,
    pub text: String,
    pub synth_duration: f64,
}

impl Fragment {
    pub fn new(id: impl Into<String>, text: impl Into<String>, synth_duration: f64) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            synth_duration,
        }
    }

    /// Character count used by the rate-based adjustment algorithms.
    pub fn chars(&self) -> usize {
        self.text.chars().filter(|c| *c != '\n').count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Head,
    Regular,
    Nonspeech,
    Tail,
}

/// A fragment with its aligned time interval.
/// Second-level interval is [begin, end), i.e. begin inclusive/end exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedFragment {
    pub id: String,
    pub kind: FragmentKind,
    pub interval: Interval,
}

/// Ordered, contiguous list of timed fragments covering the real audio.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncMap {
    pub fragments: Vec<TimedFragment>,
}

impl SyncMap {
    /// The fragments carrying actual text, in order.
    pub fn regular_fragments(&self) -> impl Iterator<Item = &TimedFragment> {
        self.fragments
            .iter()
            .filter(|f| f.kind == FragmentKind::Regular)
    }
}

/// A time interval in seconds, begin inclusive, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub begin: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(begin: f64, end: f64) -> Self {
        debug_assert!(begin <= end, "interval begin after end");
        Self { begin, end }
    }

    pub fn length(&self) -> f64 {
        self.end - self.begin
    }

    pub fn has_zero_length(&self) -> bool {
        self.begin == self.end
    }

    pub fn contains(&self, time_point: f64) -> bool {
        self.begin <= time_point && time_point <= self.end
    }

    /// The interval enlarged by `quantity` on both sides, clipped at zero.
    pub fn shadow(&self, quantity: f64) -> Interval {
        Interval {
            begin: (self.begin - quantity).max(0.0),
            end: self.end + quantity,
        }
    }

    /// True if this interval ends exactly where `other` begins.
    pub fn is_adjacent_before(&self, other: &Interval) -> bool {
        self.end == other.begin
    }

    pub fn is_non_zero_before_non_zero(&self, other: &Interval) -> bool {
        self.is_adjacent_before(other) && !self.has_zero_length() && !other.has_zero_length()
    }
}
