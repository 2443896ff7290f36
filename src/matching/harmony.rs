const NEUTRALS: &[&str] = &["white", "black", "gray", "beige", "brown", "tan", "cream"];

const COMPLEMENTARY: &[(&str, &[&str])] = &[
    ("red", &["green", "teal"]),
    ("blue", &["orange", "yellow"]),
    ("purple", &["yellow", "lime"]),
    ("green", &["red", "pink"]),
    ("orange", &["blue", "navy"]),
    ("yellow", &["purple", "violet"]),
];

const ANALOGOUS: &[(&str, &[&str])] = &[
    ("red", &["orange", "pink", "burgundy"]),
    ("blue", &["purple", "teal", "navy"]),
    ("green", &["yellow", "teal", "lime"]),
    ("orange", &["red", "yellow", "coral"]),
    ("purple", &["blue", "pink", "violet"]),
    ("yellow", &["orange", "lime", "gold"]),
];

pub const SAME: f32 = 1.0;
pub const NEUTRAL: f32 = 0.9;
pub const COMPLEMENT: f32 = 0.85;
pub const ANALOGOUS_PAIR: f32 = 0.8;
pub const UNRELATED: f32 = 0.6;
/// Used when fewer than two colors are present.
pub const NO_PAIRS: f32 = 0.8;

fn related(table: &[(&str, &[&str])], a: &str, b: &str) -> bool {
    table.iter().any(|(base, others)| {
        (*base == a && others.contains(&b)) || (*base == b && others.contains(&a))
    })
}

/// Symmetric compatibility of two color names.
pub fn pair_harmony(a: &str, b: &str) -> f32 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();

    if a == b {
        SAME
    } else if NEUTRALS.contains(&a.as_str()) || NEUTRALS.contains(&b.as_str()) {
        NEUTRAL
    } else if related(COMPLEMENTARY, &a, &b) {
        COMPLEMENT
    } else if related(ANALOGOUS, &a, &b) {
        ANALOGOUS_PAIR
    } else {
        UNRELATED
    }
}

/// Mean harmony over every unordered pair of colors.
pub fn outfit_harmony<S: AsRef<str>>(colors: &[S]) -> f32 {
    if colors.len() < 2 {
        return NO_PAIRS;
    }

    let mut total = 0.0;
    let mut pairs = 0;
    for (i, a) in colors.iter().enumerate() {
        for b in &colors[i + 1..] {
            total += pair_harmony(a.as_ref(), b.as_ref());
            pairs += 1;
        }
    }
    total / pairs as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLORS: &[&str] = &[
        "red", "green", "teal", "blue", "orange", "yellow", "purple", "lime", "pink", "navy",
        "violet", "burgundy", "coral", "gold", "white", "black", "gray", "beige", "brown", "tan",
        "cream", "maroon",
    ];

    #[test]
    fn test_pair_classes() {
        assert_eq!(pair_harmony("red", "red"), SAME);
        assert_eq!(pair_harmony("black", "pink"), NEUTRAL);
        assert_eq!(pair_harmony("red", "green"), COMPLEMENT);
        assert_eq!(pair_harmony("navy", "orange"), COMPLEMENT);
        assert_eq!(pair_harmony("blue", "navy"), ANALOGOUS_PAIR);
        assert_eq!(pair_harmony("pink", "teal"), UNRELATED);
        assert_eq!(pair_harmony("Red", " RED"), SAME);
    }

    #[test]
    fn test_harmony_is_symmetric() {
        for a in COLORS {
            for b in COLORS {
                assert_eq!(pair_harmony(a, b), pair_harmony(b, a), "{a} / {b}");
            }
        }
    }

    #[test]
    fn test_outfit_harmony() {
        assert_eq!(outfit_harmony::<&str>(&[]), NO_PAIRS);
        assert_eq!(outfit_harmony(&["red"]), NO_PAIRS);
        // red/green 0.85, red/white 0.9, green/white 0.9
        let score = outfit_harmony(&["red", "green", "white"]);
        assert!((score - (0.85 + 0.9 + 0.9) / 3.0).abs() < 1e-6);
    }
}
