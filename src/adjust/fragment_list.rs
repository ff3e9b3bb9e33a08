use crate::error::AlignError;
use crate::types::{Fragment, FragmentKind, Interval};

/// One fragment inside a [`FragmentList`]: the text fragment identity
/// plus its (mutable) time interval.
#[derive(Debug, Clone)]
pub struct ListFragment {
    pub id: String,
    pub kind: FragmentKind,
    pub chars: usize,
    pub interval: Interval,
}

impl ListFragment {
    /// Characters per second; `None` for non-regular or zero-length
    /// fragments.
    pub fn rate(&self) -> Option<f64> {
        if self.kind != FragmentKind::Regular || self.interval.has_zero_length() {
            return None;
        }
        Some(self.chars as f64 / self.interval.length())
    }

    /// Time this fragment lacks to respect `max_rate`; positive means the
    /// fragment is too fast.
    fn rate_lack(&self, max_rate: f64) -> f64 {
        if self.kind == FragmentKind::Regular {
            self.chars as f64 / max_rate - self.interval.length()
        } else {
            0.0
        }
    }

    /// Time that can be stolen from this fragment while keeping it within
    /// `max_rate`. Nonspeech fragments give up their whole length;
    /// HEAD/TAIL give nothing.
    fn rate_slack(&self, max_rate: f64) -> f64 {
        match self.kind {
            FragmentKind::Regular => -self.rate_lack(max_rate),
            FragmentKind::Nonspeech => self.interval.length(),
            FragmentKind::Head | FragmentKind::Tail => 0.0,
        }
    }
}

/// Ordered list of contiguous fragments spanning a fixed time range,
/// with a HEAD sentinel first and a TAIL sentinel last.
///
/// All mutations preserve the contiguity invariant: each fragment's end
/// equals the next fragment's begin, exactly, except across injected
/// nonspeech markers.
#[derive(Debug, Clone)]
pub struct FragmentList {
    begin: f64,
    end: f64,
    fragments: Vec<ListFragment>,
}

impl FragmentList {
    /// Build from `k + 3` non-decreasing time values: head begin, the
    /// `k + 1` fragment boundaries, and the tail end.
    pub fn from_time_values(
        fragments: &[Fragment],
        time_values: &[f64],
    ) -> Result<Self, AlignError> {
        if time_values.len() != fragments.len() + 3 {
            return Err(AlignError::configuration(format!(
                "expected {} time values for {} fragments, got {}",
                fragments.len() + 3,
                fragments.len(),
                time_values.len()
            )));
        }
        if time_values.windows(2).any(|w| w[1] < w[0]) {
            return Err(AlignError::configuration(
                "boundary time values are not non-decreasing",
            ));
        }

        let mut list = Vec::with_capacity(fragments.len() + 2);
        list.push(ListFragment {
            id: "HEAD".to_string(),
            kind: FragmentKind::Head,
            chars: 0,
            interval: Interval::new(time_values[0], time_values[1]),
        });
        for (i, fragment) in fragments.iter().enumerate() {
            list.push(ListFragment {
                id: fragment.id.clone(),
                kind: FragmentKind::Regular,
                chars: fragment.chars(),
                interval: Interval::new(time_values[i + 1], time_values[i + 2]),
            });
        }
        let end = time_values[time_values.len() - 1];
        list.push(ListFragment {
            id: "TAIL".to_string(),
            kind: FragmentKind::Tail,
            chars: 0,
            interval: Interval::new(time_values[time_values.len() - 2], end),
        });

        Ok(Self {
            begin: time_values[0],
            end,
            fragments: list,
        })
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn get(&self, index: usize) -> &ListFragment {
        &self.fragments[index]
    }

    pub fn fragments(&self) -> impl Iterator<Item = &ListFragment> {
        self.fragments.iter()
    }

    pub fn regular_fragments(&self) -> impl Iterator<Item = (usize, &ListFragment)> {
        self.fragments
            .iter()
            .enumerate()
            .filter(|(_, f)| f.kind == FragmentKind::Regular)
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Pin the list extremes: the HEAD begins at `begin` and the TAIL
    /// ends at `end`.
    pub fn pin_extremes(&mut self, begin: f64, end: f64) {
        self.begin = begin;
        self.end = end;
        if let Some(first) = self.fragments.first_mut() {
            first.interval.begin = begin;
        }
        if let Some(last) = self.fragments.last_mut() {
            last.interval.end = end;
        }
    }

    /// Shift every interval by `offset`, clipped to the list range.
    pub fn offset(&mut self, offset: f64) {
        for fragment in &mut self.fragments {
            let interval = &mut fragment.interval;
            interval.begin = (interval.begin + offset).clamp(self.begin, self.end);
            interval.end = (interval.end + offset).clamp(interval.begin, self.end);
        }
    }

    /// Move the transition point between `index` and the next fragment to
    /// `value`. Fails silently when the move would break the list
    /// constraints: `index` out of the adjustable range, `value` outside
    /// the two intervals, or a zero-length fragment on either side.
    pub fn move_transition_point(&mut self, index: usize, value: f64) {
        if self.len() < 3 || index > self.len() - 3 {
            return;
        }
        let current = self.fragments[index].interval;
        let next = self.fragments[index + 1].interval;
        if value > next.end || value < current.begin {
            return;
        }
        if !current.is_non_zero_before_non_zero(&next) {
            return;
        }
        self.fragments[index].interval.end = value;
        self.fragments[index + 1].interval.begin = value;
    }

    /// Pairs (nonspeech interval, fragment index) such that exactly one
    /// fragment end falls inside the interval, within `tolerance`.
    /// HEAD/TAIL and the last regular fragment are never returned, and an
    /// interval swallowing a whole fragment is discarded.
    pub fn fragments_ending_inside_nonspeech(
        &self,
        nonspeech: &[Interval],
        tolerance: f64,
    ) -> Vec<(Interval, usize)> {
        let mut candidates: Vec<Option<Vec<usize>>> = vec![Some(Vec::new()); nonspeech.len()];
        let mut nsi_index = 0;
        let mut frag_index = 0;
        while nsi_index < nonspeech.len() && frag_index + 1 < self.len() {
            let nsi = nonspeech[nsi_index];
            if nsi.end > self.end {
                break;
            }
            let shadow = nsi.shadow(tolerance);
            let fragment = &self.fragments[frag_index];
            if matches!(fragment.kind, FragmentKind::Head | FragmentKind::Tail) {
                frag_index += 1;
                continue;
            }
            if shadow.contains(fragment.interval.end) {
                if shadow.contains(fragment.interval.begin) {
                    // the interval swallows the fragment: ambiguous
                    candidates[nsi_index] = None;
                    nsi_index += 1;
                    frag_index += 1;
                } else {
                    if let Some(c) = candidates[nsi_index].as_mut() {
                        c.push(frag_index);
                    }
                    frag_index += 1;
                }
            } else if shadow.begin > fragment.interval.end {
                frag_index += 1;
            } else {
                nsi_index += 1;
            }
        }
        nonspeech
            .iter()
            .zip(candidates)
            .filter_map(|(nsi, c)| match c.as_deref() {
                Some([index]) => Some((*nsi, *index)),
                _ => None,
            })
            .collect()
    }

    /// Inject NONSPEECH marker fragments over the given intervals,
    /// shrinking the two neighbors to the interval extremes. `pairs` must
    /// come from [`Self::fragments_ending_inside_nonspeech`].
    pub fn inject_nonspeech_fragments(&mut self, pairs: &[(Interval, usize)]) {
        for &(nsi, index) in pairs {
            self.fragments[index].interval.end = nsi.begin;
            self.fragments[index + 1].interval.begin = nsi.end;
        }
        for (i, &(nsi, _)) in pairs.iter().enumerate() {
            self.fragments.push(ListFragment {
                id: format!("n{:06}", i + 1),
                kind: FragmentKind::Nonspeech,
                chars: 0,
                interval: nsi,
            });
        }
        self.fragments.sort_by(|a, b| {
            (a.interval.begin, a.interval.end)
                .partial_cmp(&(b.interval.begin, b.interval.end))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    pub fn has_zero_length_fragments(&self, min_index: usize, max_index: usize) -> bool {
        self.fragments[min_index..max_index]
            .iter()
            .any(|f| f.interval.has_zero_length())
    }

    /// Enlarge zero-length fragments in `[min_index, max_index)` to
    /// `duration` seconds, borrowing the time from the following
    /// fragments (shrinking the first one long enough, or moving the
    /// whole block back when the range end is reached).
    pub fn fix_zero_length_fragments(&mut self, duration: f64, min_index: usize, max_index: usize) {
        if self.fragments.is_empty() || duration <= 0.0 {
            return;
        }

        let first_was_adjacent = min_index > 0
            && self.fragments[min_index - 1]
                .interval
                .is_adjacent_before(&self.fragments[min_index].interval);
        let last_was_adjacent = self.len() > 1
            && max_index < self.len()
            && self.fragments[max_index - 1]
                .interval
                .is_adjacent_before(&self.fragments[max_index].interval);

        #[derive(Clone, Copy)]
        enum Move {
            Enlarge,
            Shift,
        }

        let mut i = min_index;
        while i < max_index {
            if self.fragments[i].interval.has_zero_length() {
                let mut moves: Vec<(usize, Move)> = vec![(i, Move::Enlarge)];
                let mut slack = duration;
                let mut j = i + 1;
                while j < max_index && self.fragments[j].interval.length() < slack {
                    if self.fragments[j].interval.has_zero_length() {
                        moves.push((j, Move::Enlarge));
                        slack += duration;
                    } else {
                        moves.push((j, Move::Shift));
                    }
                    j += 1;
                }
                let mut current_time = None;
                if j == max_index {
                    if self.fragments[j - 1].interval.end + slack <= self.end {
                        current_time = Some(self.fragments[j - 1].interval.end + slack);
                    }
                } else {
                    // shrink the first fragment with enough room
                    let interval = &mut self.fragments[j].interval;
                    interval.begin += slack;
                    current_time = Some(interval.begin);
                }
                if let Some(mut time) = current_time {
                    for &(index, kind) in moves.iter().rev() {
                        let interval = &mut self.fragments[index].interval;
                        let length = interval.length();
                        interval.end = time;
                        interval.begin = time - length;
                        if let Move::Enlarge = kind {
                            interval.begin -= duration;
                        }
                        time = interval.begin;
                    }
                } else {
                    tracing::debug!(index = i, "unable to fix zero-length fragment");
                }
                i = j.saturating_sub(1);
            }
            i += 1;
        }

        if first_was_adjacent
            && self.fragments[min_index].interval.begin != self.fragments[min_index - 1].interval.end
        {
            self.fragments[min_index].interval.begin = self.fragments[min_index - 1].interval.end;
        }
        if last_was_adjacent
            && self.fragments[max_index].interval.begin != self.fragments[max_index - 1].interval.end
        {
            self.fragments[max_index].interval.begin = self.fragments[max_index - 1].interval.end;
        }
    }

    /// Try to bring the fragment at `index` within `max_rate` characters
    /// per second by borrowing slack from the previous fragment, and, in
    /// aggressive mode, from the next one as well. Returns true when the
    /// lack was fully recovered.
    pub fn fix_fragment_rate(&mut self, index: usize, max_rate: f64, aggressive: bool) -> bool {
        if index > 0 && self.fix_pair(index, index - 1, max_rate) {
            return true;
        }
        if aggressive && index + 1 < self.len() {
            return self.fix_pair(index, index + 1, max_rate);
        }
        false
    }

    fn fix_pair(&mut self, current: usize, donor: usize, max_rate: f64) -> bool {
        let donor_is_previous = donor < current;
        let current_fragment = &self.fragments[current];
        let donor_fragment = &self.fragments[donor];
        if current_fragment.rate().is_some_and(|r| r <= max_rate) {
            return true;
        }
        let adjacent = if donor_is_previous {
            donor_fragment
                .interval
                .is_non_zero_before_non_zero(&current_fragment.interval)
        } else {
            current_fragment
                .interval
                .is_non_zero_before_non_zero(&donor_fragment.interval)
        };
        if !adjacent {
            return false;
        }

        let current_lack = current_fragment.rate_lack(max_rate);
        let donor_slack = donor_fragment.rate_slack(max_rate);
        if donor_slack <= 0.0 {
            return false;
        }
        let effective = current_lack.min(donor_slack);
        if donor_is_previous {
            let value = self.fragments[donor].interval.end - effective;
            self.move_transition_point(donor, value);
        } else {
            let value = self.fragments[current].interval.end + effective;
            self.move_transition_point(current, value);
        }
        effective == current_lack
    }

    /// Remove NONSPEECH fragments; with `zero_length_only`, keep the
    /// non-empty ones as gap markers.
    pub fn remove_nonspeech_fragments(&mut self, zero_length_only: bool) {
        self.fragments.retain(|f| {
            f.kind != FragmentKind::Nonspeech
                || (zero_length_only && !f.interval.has_zero_length())
        });
    }
}
