//! Sentiment records and the client that produces them.
//!
//! A [`SentimentRecord`] is built once per analysis from the backend's
//! structured reply ([`RawAnalysis`]) and then treated as immutable.

pub mod client;
pub mod error;

use serde::Deserialize;

pub use client::GeminiClient;
pub use error::AnalyzeError;

/// Parent score above which generated posts read as positive.
pub const POSITIVE_THRESHOLD: f32 = 0.3;
/// Parent score below which generated posts read as negative.
pub const NEGATIVE_THRESHOLD: f32 = -0.3;
/// Number of posts the prompt asks for. The schema does not enforce it.
pub const REQUESTED_POSTS: usize = 5;
/// Display timestamp stamped on every generated post.
pub const JUST_NOW: &str = "Just now";

/// Coarse direction of the mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    /// Only the startup placeholder uses this.
    Stable,
}

impl Trend {
    /// `Up` iff the score is strictly positive.
    pub fn from_score(score: f32) -> Self {
        if score > 0.0 {
            Trend::Up
        } else {
            Trend::Down
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Stable => "stable",
        }
    }
}

/// Tone of one generated post, inherited from the record's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSentiment {
    Positive,
    Negative,
    Neutral,
}

impl PostSentiment {
    pub fn from_score(score: f32) -> Self {
        if score > POSITIVE_THRESHOLD {
            PostSentiment::Positive
        } else if score < NEGATIVE_THRESHOLD {
            PostSentiment::Negative
        } else {
            PostSentiment::Neutral
        }
    }
}

/// One synthetic social-media post.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    /// `"<index>-<generation millis>"`, unique within its record.
    pub id: String,
    pub author: String,
    pub handle: String,
    pub content: String,
    pub timestamp: String,
    pub sentiment: PostSentiment,
}

/// Result of one topic analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentRecord {
    /// Aggregate mood in `[-1, 1]`.
    pub score: f32,
    pub summary: String,
    pub posts: Vec<Post>,
    pub trend: Trend,
}

impl SentimentRecord {
    /// What the shell shows before the first analysis lands.
    pub fn placeholder() -> Self {
        Self {
            score: 0.1,
            summary: "Awaiting topic analysis to determine global pulse.".to_string(),
            posts: Vec::new(),
            trend: Trend::Stable,
        }
    }

    /// Derive a record from the backend reply. `generated_at_ms` seeds post ids.
    pub fn from_raw(raw: RawAnalysis, generated_at_ms: u128) -> Self {
        let score = if (-1.0..=1.0).contains(&raw.score) {
            raw.score as f32
        } else {
            log::warn!("Backend score {} outside [-1, 1], clamping", raw.score);
            raw.score.clamp(-1.0, 1.0) as f32
        };
        let sentiment = PostSentiment::from_score(score);

        let posts = raw
            .posts
            .into_iter()
            .enumerate()
            .map(|(idx, p)| Post {
                id: format!("{}-{}", idx, generated_at_ms),
                author: p.author,
                handle: p.handle,
                content: p.content,
                timestamp: JUST_NOW.to_string(),
                sentiment,
            })
            .collect();

        Self {
            score,
            summary: raw.summary,
            posts,
            trend: Trend::from_score(score),
        }
    }
}

/// The structured reply, exactly as the response schema declares it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawAnalysis {
    pub score: f64,
    pub summary: String,
    pub posts: Vec<RawPost>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawPost {
    pub author: String,
    pub handle: String,
    pub content: String,
}

/// Anything that can turn a topic into a [`SentimentRecord`].
///
/// Implementations block; callers run them off the UI thread.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, topic: &str) -> Result<SentimentRecord, AnalyzeError>;
}
