use crate::types::Fragment;

/// Begin time of each fragment inside the synthesized wave, from the
/// per-fragment durations reported by the TTS collaborator.
pub fn synth_anchors(fragments: &[Fragment]) -> Vec<f64> {
    let mut anchors = Vec::with_capacity(fragments.len());
    let mut t = 0.0;
    for fragment in fragments {
        anchors.push(t);
        t += fragment.synth_duration;
    }
    anchors
}

/// Map synthesized anchor times onto real-wave frame indices through the
/// alignment path.
///
/// For `k` anchors the result has `k + 1` entries: the begin frame of
/// each fragment plus the tail frame. The split point for an anchor is
/// the first path entry whose synth index lies past the anchor frame, so
/// a boundary lands at the very beginning of the next fragment; the
/// first split is forced to the path start.
pub fn compute_boundaries(
    path: &[(usize, usize)],
    anchors: &[f64],
    window_shift: f64,
    tail_frame: usize,
) -> Vec<usize> {
    debug_assert!(!path.is_empty());
    let mut boundaries = Vec::with_capacity(anchors.len() + 1);
    for (k, anchor) in anchors.iter().enumerate() {
        if k == 0 {
            boundaries.push(path[0].0);
            continue;
        }
        let anchor_frame = (anchor / window_shift) as usize;
        // right-sided search, clipped so the lookup below stays valid
        let pos = path
            .partition_point(|&(_, s)| s <= anchor_frame)
            .min(path.len() - 1);
        boundaries.push(path[pos].0);
    }
    boundaries.push(tail_frame);
    boundaries
}

/// Evenly spaced fallback boundaries over `[0, tail_frame)`, used when a
/// masked wave has no speech frames left to align.
pub fn fallback_boundaries(tail_frame: usize, num_fragments: usize) -> Vec<usize> {
    let step = tail_frame as f64 / num_fragments as f64;
    let mut boundaries: Vec<usize> = (0..num_fragments)
        .map(|i| (i as f64 * step) as usize)
        .collect();
    boundaries.push(tail_frame);
    boundaries
}
