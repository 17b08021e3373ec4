//! Video search. Answers with placeholder results until a content query
//! integration exists.

use serde::Serialize;

const PLACEHOLDER_COVER: &str = "https://via.placeholder.com/300x400";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub cover_image_url: String,
    pub view_count: u64,
    pub like_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub videos: Vec<Video>,
    pub message: String,
}

// TODO: call TikTok's video query API instead of returning placeholders.
pub fn search(query: &str) -> SearchResults {
    SearchResults {
        videos: vec![
            Video {
                id: "example1".to_string(),
                title: format!("Example cooking video for: {query}"),
                cover_image_url: PLACEHOLDER_COVER.to_string(),
                view_count: 150_000,
                like_count: 25_000,
            },
            Video {
                id: "example2".to_string(),
                title: format!("How to cook {query} - Easy recipe"),
                cover_image_url: PLACEHOLDER_COVER.to_string(),
                view_count: 89_000,
                like_count: 12_000,
            },
        ],
        message: "This is a mock response. Implement TikTok Video Query API for real results."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles_mention_query() {
        let results = search("ramen");
        assert_eq!(results.videos.len(), 2);
        assert!(results.videos.iter().all(|video| video.title.contains("ramen")));
    }
}
