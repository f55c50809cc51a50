//! Break point detection for chunking

/// Priority levels for break points
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BreakPriority {
    /// Word boundary (lowest)
    Word = 1,
    /// Sentence boundary
    Sentence = 2,
    /// Line boundary
    Line = 3,
    /// Paragraph boundary (highest)
    Paragraph = 4,
}

/// A potential break point in text
#[derive(Debug, Clone)]
pub struct BreakPoint {
    /// Byte position (always on a char boundary)
    pub position: usize,
    /// Priority of this break point
    pub priority: BreakPriority,
}

impl BreakPoint {
    pub fn new(position: usize, priority: BreakPriority) -> Self {
        Self { position, priority }
    }
}

/// Scan the text once and collect every candidate break position.
///
/// A break at position `p` means "a segment may end at `p`", so the position
/// recorded is the byte index just after the separator.
pub fn find_break_points(text: &str) -> Vec<BreakPoint> {
    let mut points = Vec::new();

    // Paragraph breaks (double newlines)
    for (i, _) in text.match_indices("\n\n") {
        let pos = i + 2;
        if pos < text.len() {
            points.push(BreakPoint::new(pos, BreakPriority::Paragraph));
        }
    }

    // Line breaks
    for (i, _) in text.match_indices('\n') {
        let pos = i + 1;
        if pos < text.len() {
            points.push(BreakPoint::new(pos, BreakPriority::Line));
        }
    }

    // Sentence boundaries
    for pat in [". ", "? ", "! "] {
        for (i, _) in text.match_indices(pat) {
            let pos = i + 2;
            if pos < text.len() {
                points.push(BreakPoint::new(pos, BreakPriority::Sentence));
            }
        }
    }

    // Word boundaries
    for (i, _) in text.match_indices(' ') {
        let pos = i + 1;
        if pos < text.len() {
            points.push(BreakPoint::new(pos, BreakPriority::Word));
        }
    }

    // Sort by position, keep the highest priority at each position
    points.sort_by_key(|p| (p.position, std::cmp::Reverse(p.priority)));
    points.dedup_by_key(|p| p.position);

    points
}

/// Ensure a position is on a valid UTF-8 character boundary, searching backwards
pub fn ensure_char_boundary(text: &str, pos: usize) -> usize {
    if pos >= text.len() {
        return text.len();
    }
    let mut adjusted = pos;
    while adjusted > 0 && !text.is_char_boundary(adjusted) {
        adjusted -= 1;
    }
    adjusted
}

/// Pick the best break position in `(window_start, target]`, preferring the
/// highest-priority separator and, among equals, the one closest to `target`.
/// Falls back to a hard character cut at `target` when the window has no
/// separator at all.
pub fn find_best_break(
    text: &str,
    window_start: usize,
    target: usize,
    break_points: &[BreakPoint],
) -> usize {
    let first = break_points.partition_point(|p| p.position <= window_start);
    let last = break_points.partition_point(|p| p.position <= target);

    if let Some(best) = break_points[first..last]
        .iter()
        .max_by_key(|p| (p.priority, p.position))
    {
        return best.position;
    }

    ensure_char_boundary(text, target)
}
