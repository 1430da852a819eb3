//! Wire types of the reddit JSON API.

use serde::Deserialize;

use crate::post::Post;

#[derive(Debug, Deserialize)]
pub(crate) struct Listing<T> {
    pub data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingData<T> {
    pub children: Vec<Thing<T>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Thing<T> {
    pub data: T,
}

/// `t3` (link/self post) fields we read.
#[derive(Debug, Deserialize)]
pub(crate) struct SubmissionData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub author_fullname: Option<String>,
}

impl From<SubmissionData> for Post {
    fn from(data: SubmissionData) -> Self {
        Post {
            id: data.id,
            fullname: data.name,
            title: data.title,
            body: data.selftext,
            author: data.author,
            author_fullname: data.author_fullname,
        }
    }
}

/// Inbox message fields we read. Username mentions are `t1` comments.
#[derive(Debug, Deserialize)]
pub(crate) struct MessageData {
    pub name: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub new: bool,
    /// Permalink of the comment, e.g. `/r/HFY/comments/f6iwyk/slug/fi53y86/?context=3`.
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: Option<String>,
    pub expires_in: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentResponse {
    pub json: CommentJson,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentJson {
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_listing_deserializes() {
        let json = r#"{"kind":"Listing","data":{"after":null,"children":[{"kind":"t3","data":{
            "id":"f6iwyk","name":"t3_f6iwyk","title":"Of Men and Dragons","selftext":"Body\n\n[Next](https://redd.it/x)",
            "author":"writer","author_fullname":"t2_abc","score":12}}]}}"#;
        let listing: Listing<SubmissionData> = serde_json::from_str(json).unwrap();
        let post: Post = listing.data.children.into_iter().next().unwrap().data.into();
        assert_eq!(post.id, "f6iwyk");
        assert_eq!(post.fullname, "t3_f6iwyk");
        assert_eq!(post.author_fullname.as_deref(), Some("t2_abc"));
        assert!(post.body.contains("[Next]"));
    }

    #[test]
    fn test_deleted_author_deserializes() {
        let json = r#"{"kind":"Listing","data":{"children":[{"kind":"t1","data":{
            "name":"t1_fi53y86","body":"u/epubBot","author":null,"new":true,
            "context":"/r/HFY/comments/f6iwyk/of_men/fi53y86/?context=3"}}]}}"#;
        let listing: Listing<MessageData> = serde_json::from_str(json).unwrap();
        let message = &listing.data.children[0].data;
        assert!(message.new);
        assert_eq!(message.author, None);
    }
}
