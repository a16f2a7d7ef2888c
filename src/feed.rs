//! Live-feed presentation model.
//!
//! The sidebar draws whatever [`feed_rows`] returns: a fixed block of
//! skeleton rows while a request is in flight, the record's posts otherwise.

use crate::sentiment::Post;

/// Skeleton rows shown while loading, independent of the post count.
pub const SKELETON_ROWS: usize = 4;
/// Static engagement counters shown under every post.
pub const REPLY_COUNT_LABEL: &str = "24";
pub const LIKE_COUNT_LABEL: &str = "1.2k";

/// One row of the feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeedRow<'a> {
    Skeleton,
    Post(&'a Post),
}

/// Rows to draw for the current state.
pub fn feed_rows(posts: &[Post], loading: bool) -> Vec<FeedRow<'_>> {
    if loading {
        vec![FeedRow::Skeleton; SKELETON_ROWS]
    } else {
        posts.iter().map(FeedRow::Post).collect()
    }
}

/// First character of the author's name, for the avatar bubble.
pub fn avatar_initial(author: &str) -> String {
    author
        .chars()
        .next()
        .map(String::from)
        .unwrap_or_else(|| "?".to_string())
}

/// `@handle`, without doubling an `@` the backend already supplied.
pub fn display_handle(handle: &str) -> String {
    format!("@{}", handle.trim_start_matches('@'))
}
