use rand::Rng;

// Visual constants shared by the store and the renderer
pub const MIN_RADIUS: f32 = 30.0;
pub const FONT_SIZE: f32 = 10.0;
pub const WRAP_WIDTH: usize = 10;
pub const LINE_HIT_TOLERANCE: f32 = 5.0;
pub const PLACEMENT_MARGIN: f32 = 10.0;
pub const PLACEMENT_ATTEMPTS: usize = 100;
pub const FALLBACK_POSITION: Point = Point { x: 100.0, y: 100.0 };

/// A position in canvas space.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn offset(self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// Scale this point away from (or toward) `anchor`.
    pub fn scaled_about(self, anchor: Point, factor: f32) -> Point {
        Point::new(
            anchor.x + (self.x - anchor.x) * factor,
            anchor.y + (self.y - anchor.y) * factor,
        )
    }
}

/// Axis-aligned rectangle used as the placement area for new vertices.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub const fn from_size(width: f32, height: f32) -> Self {
        Self { min: Point::ORIGIN, max: Point { x: width, y: height } }
    }

    /// Shrink on every side; `None` when nothing is left.
    pub fn inset(&self, amount: f32) -> Option<Bounds> {
        let b = Bounds {
            min: self.min.offset(amount, amount),
            max: self.max.offset(-amount, -amount),
        };
        if b.min.x <= b.max.x && b.min.y <= b.max.y { Some(b) } else { None }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds::from_size(600.0, 400.0)
    }
}

/// Arrow line between two vertex circumferences; the head sits at `end`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Arrow {
    pub start: Point,
    pub end: Point,
}

pub fn point_in_circle(p: Point, center: Point, radius: f32) -> bool {
    p.distance(center) <= radius
}

/// Perpendicular distance from `p` to the infinite line through `a` and `b`.
///
/// Points past either end of the segment still measure against the extended
/// line, so a click far beyond an arrow tip can register as "near".
pub fn distance_to_line(p: Point, a: Point, b: Point) -> f32 {
    let dy = b.y - a.y;
    let dx = b.x - a.x;
    let len = (dy * dy + dx * dx).sqrt();
    if len <= f32::EPSILON {
        return p.distance(a);
    }
    (dy * p.x - dx * p.y + b.x * a.y - b.y * a.x).abs() / len
}

pub fn point_near_line(p: Point, a: Point, b: Point, tolerance: f32) -> bool {
    distance_to_line(p, a, b) <= tolerance
}

/// Endpoints of an arrow from circle 1 to circle 2, each pulled back onto the
/// circle's circumference along the line between the centers.
pub fn arrow_endpoints(c1: Point, r1: f32, c2: Point, r2: f32) -> Arrow {
    let angle = (c2.y - c1.y).atan2(c2.x - c1.x);
    let (sin, cos) = angle.sin_cos();
    Arrow {
        start: Point::new(c1.x + r1 * cos, c1.y + r1 * sin),
        end: Point::new(c2.x - r2 * cos, c2.y - r2 * sin),
    }
}

/// Best-effort random placement of a circle of `radius` inside `bounds`.
///
/// Candidates are drawn uniformly from `bounds` inset by `radius + 10` and the
/// first one keeping a 10 unit gap to every circle in `existing` wins. After
/// `max_attempts` misses (or when the inset area is empty) this returns
/// [`FALLBACK_POSITION`], which may overlap.
pub fn find_non_overlapping_position<R: Rng>(
    radius: f32,
    bounds: Bounds,
    existing: &[(Point, f32)],
    max_attempts: usize,
    rng: &mut R,
) -> Point {
    let Some(area) = bounds.inset(radius + PLACEMENT_MARGIN) else {
        return FALLBACK_POSITION;
    };
    for _ in 0..max_attempts {
        let candidate = Point::new(
            rng.random_range(area.min.x..=area.max.x),
            rng.random_range(area.min.y..=area.max.y),
        );
        let clear = existing
            .iter()
            .all(|(c, r)| candidate.distance(*c) >= radius + r + PLACEMENT_MARGIN);
        if clear {
            return candidate;
        }
    }
    FALLBACK_POSITION
}

/// Greedy word wrap at `width` characters.
///
/// Whitespace runs separate words and are dropped at line starts and ends.
/// Hyphenated words may also break after a hyphen that follows at least two
/// letters or digits. A word longer than the width is split so its head fills
/// the rest of the current line. Empty or blank input wraps to no lines.
pub fn wrap_note(note: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    // Chunks alternate between words and whitespace runs (normalized to spaces)
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_is_space = false;
    for ch in note.chars() {
        let is_space = ch.is_whitespace();
        if !current.is_empty() && is_space != current_is_space {
            push_chunk(&mut chunks, std::mem::take(&mut current), current_is_space);
        }
        current_is_space = is_space;
        current.push(if is_space { ' ' } else { ch });
    }
    if !current.is_empty() {
        push_chunk(&mut chunks, current, current_is_space);
    }
    chunks.reverse();

    let mut lines = Vec::new();
    while !chunks.is_empty() {
        let mut line: Vec<String> = Vec::new();
        let mut line_len = 0usize;
        if !lines.is_empty() && chunks.last().is_some_and(|c| c.trim().is_empty()) {
            chunks.pop();
        }
        while let Some(chunk) = chunks.last() {
            let len = chunk.chars().count();
            if line_len + len > width {
                break;
            }
            line_len += len;
            line.extend(chunks.pop());
        }
        if let Some(chunk) = chunks.last_mut() {
            if chunk.chars().count() > width {
                let space_left = width.saturating_sub(line_len).max(1);
                let head: String = chunk.chars().take(space_left).collect();
                let tail: String = chunk.chars().skip(space_left).collect();
                *chunk = tail;
                line.push(head);
            }
        }
        if line.last().is_some_and(|c| c.trim().is_empty()) {
            line.pop();
        }
        if !line.is_empty() {
            lines.push(line.concat());
        }
    }
    lines
}

// Words are pushed as their hyphen-separated pieces ("well-" + "known")
fn push_chunk(chunks: &mut Vec<String>, chunk: String, is_space: bool) {
    if is_space {
        chunks.push(chunk);
        return;
    }
    let chars: Vec<char> = chunk.chars().collect();
    let mut start = 0;
    for i in 2..chars.len() {
        let breakable = chars[i] == '-'
            && i - start >= 2
            && chars[i - 1].is_alphanumeric()
            && chars[i - 2].is_alphanumeric()
            && chars.get(i + 1).is_some_and(|c| c.is_alphanumeric());
        if breakable {
            chunks.push(chars[start..=i].iter().collect());
            start = i + 1;
        }
    }
    chunks.push(chars[start..].iter().collect());
}

/// Radius rule: one font-size step per wrapped line, never below [`MIN_RADIUS`].
pub fn radius_for_note(note: &str) -> f32 {
    let line_count = wrap_note(note, WRAP_WIDTH).len().max(1);
    (line_count as f32 * FONT_SIZE).max(MIN_RADIUS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn circle_hit_includes_boundary() {
        let c = Point::new(10.0, 10.0);
        assert!(point_in_circle(Point::new(10.0, 40.0), c, 30.0));
        assert!(!point_in_circle(Point::new(10.0, 40.5), c, 30.0));
    }

    #[test]
    fn line_hit_within_tolerance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(100.0, 0.0);
        assert!(point_near_line(Point::new(50.0, 3.0), a, b, LINE_HIT_TOLERANCE));
        assert!(!point_near_line(Point::new(50.0, 10.0), a, b, LINE_HIT_TOLERANCE));
        // Measured against the infinite line
        assert!(point_near_line(Point::new(500.0, 2.0), a, b, LINE_HIT_TOLERANCE));
    }

    #[test]
    fn degenerate_line_uses_point_distance() {
        let a = Point::new(5.0, 5.0);
        assert!(point_near_line(Point::new(8.0, 5.0), a, a, 5.0));
        assert!(!point_near_line(Point::new(20.0, 5.0), a, a, 5.0));
    }

    #[test]
    fn arrow_starts_and_ends_on_circumference() {
        let arrow = arrow_endpoints(Point::new(0.0, 0.0), 30.0, Point::new(100.0, 0.0), 40.0);
        assert!((arrow.start.x - 30.0).abs() < 1e-4 && arrow.start.y.abs() < 1e-4);
        assert!((arrow.end.x - 60.0).abs() < 1e-4 && arrow.end.y.abs() < 1e-4);

        let diag = arrow_endpoints(Point::new(0.0, 0.0), 10.0, Point::new(30.0, 40.0), 10.0);
        assert!((diag.start.x - 6.0).abs() < 1e-4 && (diag.start.y - 8.0).abs() < 1e-4);
        assert!((diag.end.x - 24.0).abs() < 1e-4 && (diag.end.y - 32.0).abs() < 1e-4);
    }

    #[test]
    fn placement_keeps_clear_of_existing_vertex() {
        let mut rng = StdRng::seed_from_u64(7);
        let existing = [(Point::new(100.0, 100.0), 30.0)];
        let bounds = Bounds::from_size(600.0, 400.0);
        for _ in 0..200 {
            let p = find_non_overlapping_position(30.0, bounds, &existing, PLACEMENT_ATTEMPTS, &mut rng);
            assert!(p.distance(Point::new(100.0, 100.0)) >= 70.0, "placed too close: {p:?}");
            assert!(p.x >= 40.0 && p.x <= 560.0 && p.y >= 40.0 && p.y <= 360.0);
        }
    }

    #[test]
    fn placement_falls_back_when_bounds_too_small() {
        let mut rng = StdRng::seed_from_u64(1);
        let p = find_non_overlapping_position(30.0, Bounds::from_size(50.0, 50.0), &[], 100, &mut rng);
        assert_eq!(p, FALLBACK_POSITION);
    }

    #[test]
    fn placement_falls_back_when_area_is_full() {
        let mut rng = StdRng::seed_from_u64(3);
        // One huge circle covering the whole area
        let existing = [(Point::new(300.0, 200.0), 1000.0)];
        let p = find_non_overlapping_position(30.0, Bounds::default(), &existing, 20, &mut rng);
        assert_eq!(p, FALLBACK_POSITION);
    }

    #[test]
    fn wrap_follows_word_boundaries() {
        assert_eq!(wrap_note("hello world again", 10), vec!["hello", "world", "again"]);
        assert_eq!(wrap_note("a b c d e f", 10), vec!["a b c d e", "f"]);
        assert!(wrap_note("", 10).is_empty());
        assert!(wrap_note("   ", 10).is_empty());
    }

    #[test]
    fn wrap_breaks_long_words_into_remaining_space() {
        assert_eq!(wrap_note("abcdefghijklmnop", 10), vec!["abcdefghij", "klmnop"]);
        assert_eq!(wrap_note("ab verylongword", 10), vec!["ab verylon", "gword"]);
    }

    #[test]
    fn wrap_breaks_after_hyphens() {
        assert_eq!(
            wrap_note("abcdef-abcdef-abcdef-abcdef", 10),
            vec!["abcdef-", "abcdef-", "abcdef-", "abcdef"]
        );
        assert_eq!(radius_for_note("abcdef-abcdef-abcdef-abcdef"), 40.0);
        assert_eq!(wrap_note("well-known fact", 10), vec!["well-known", "fact"]);
        // Too short before the hyphen, or nothing after it
        assert_eq!(wrap_note("a-b", 10), vec!["a-b"]);
        assert_eq!(wrap_note("abc- x", 10), vec!["abc- x"]);
    }

    #[test]
    fn radius_grows_with_line_count() {
        assert_eq!(radius_for_note(""), MIN_RADIUS);
        assert_eq!(radius_for_note("short"), MIN_RADIUS);
        let long = "word ".repeat(40);
        let lines = wrap_note(&long, WRAP_WIDTH).len();
        assert_eq!(lines, 20);
        assert_eq!(radius_for_note(&long), 200.0);
    }
}
