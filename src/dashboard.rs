//! Overlay read-outs derived from the current score.

/// Viewports narrower than this (logical px) use the compact layout.
pub const NARROW_BREAKPOINT: f32 = 768.0;

/// Score above which the planet is flourishing.
pub const FLOURISH_THRESHOLD: f32 = 0.5;
/// Score below which the planet is collapsing.
pub const COLLAPSE_THRESHOLD: f32 = -0.5;

pub fn is_narrow(width: f32) -> bool {
    width < NARROW_BREAKPOINT
}

/// Color family for the big score read-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTone {
    Positive,
    Negative,
    Neutral,
}

impl ScoreTone {
    pub fn from_score(score: f32) -> Self {
        if score > FLOURISH_THRESHOLD {
            ScoreTone::Positive
        } else if score < COLLAPSE_THRESHOLD {
            ScoreTone::Negative
        } else {
            ScoreTone::Neutral
        }
    }

    /// sRGB display color.
    pub fn rgb(self) -> [u8; 3] {
        match self {
            ScoreTone::Positive => [52, 211, 153],
            ScoreTone::Negative => [244, 63, 94],
            ScoreTone::Neutral => [129, 140, 248],
        }
    }
}

/// Score as a whole percentage, rounding halves away from zero.
pub fn score_percent(score: f32) -> i32 {
    (score * 100.0).round() as i32
}

/// Emphasis of a stat card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardStyle {
    Plain,
    Warning,
    Glow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
    pub style: CardStyle,
}

/// The four cards along the bottom of the globe view.
pub fn stat_cards(score: f32) -> [StatCard; 4] {
    let collapsing = score < COLLAPSE_THRESHOLD;
    let flourishing = score > FLOURISH_THRESHOLD;

    let tectonic = StatCard {
        label: "Tectonic",
        value: if collapsing { "Critical" } else { "Stable" }.to_string(),
        style: if collapsing { CardStyle::Warning } else { CardStyle::Plain },
    };
    let biometrics = StatCard {
        label: "Bio-Metrics",
        value: if flourishing {
            "Flourish"
        } else if collapsing {
            "Collapse"
        } else {
            "Nominal"
        }
        .to_string(),
        style: if flourishing { CardStyle::Glow } else { CardStyle::Plain },
    };

    [
        tectonic,
        StatCard {
            label: "Global Reach",
            value: "2.4B nodes".to_string(),
            style: CardStyle::Plain,
        },
        biometrics,
        StatCard {
            label: "Latency",
            value: "12ms".to_string(),
            style: CardStyle::Plain,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoint() {
        assert!(is_narrow(767.9));
        assert!(!is_narrow(768.0));
    }

    #[test]
    fn tones() {
        assert_eq!(ScoreTone::from_score(0.6), ScoreTone::Positive);
        assert_eq!(ScoreTone::from_score(0.5), ScoreTone::Neutral);
        assert_eq!(ScoreTone::from_score(-0.5), ScoreTone::Neutral);
        assert_eq!(ScoreTone::from_score(-0.9), ScoreTone::Negative);
    }

    #[test]
    fn percent_rounds_half_away_from_zero() {
        assert_eq!(score_percent(0.6), 60);
        assert_eq!(score_percent(-0.9), -90);
        assert_eq!(score_percent(0.125), 13);
        assert_eq!(score_percent(0.0), 0);
    }

    #[test]
    fn collapse_cards() {
        let cards = stat_cards(-0.9);
        assert_eq!(cards[0].value, "Critical");
        assert_eq!(cards[0].style, CardStyle::Warning);
        assert_eq!(cards[2].value, "Collapse");
        assert_eq!(cards[2].style, CardStyle::Plain);
    }

    #[test]
    fn flourish_cards() {
        let cards = stat_cards(0.6);
        assert_eq!(cards[0].value, "Stable");
        assert_eq!(cards[2].value, "Flourish");
        assert_eq!(cards[2].style, CardStyle::Glow);
        assert_eq!(cards[1].value, "2.4B nodes");
        assert_eq!(cards[3].value, "12ms");
    }

    #[test]
    fn nominal_cards() {
        let cards = stat_cards(0.1);
        assert_eq!(cards[0].value, "Stable");
        assert_eq!(cards[2].value, "Nominal");
    }
}
