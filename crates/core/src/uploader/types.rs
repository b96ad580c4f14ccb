//! Upload request/response types and object naming.

use chrono::Utc;
use uuid::Uuid;

/// One object to push to storage.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Full object name, e.g. `users/{uid}/moments/videos/{file}`.
    pub object_name: String,
    /// Content type declared at initiation and sent with the body.
    pub content_type: String,
    /// Account recorded as the object's creator.
    pub creator: String,
    pub data: Vec<u8>,
    pub bearer: String,
}

/// A stored object with its tokenized public URL.
#[derive(Debug, Clone)]
pub struct UploadedObject {
    pub object_name: String,
    /// `{object url}?alt=media&token={download token}`.
    pub public_url: String,
    pub download_token: String,
}

fn object_file_name(extension: &str) -> String {
    format!(
        "{}_{}.{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        extension
    )
}

/// Object name for a thumbnail under the user's moments tree.
pub fn thumbnail_object_name(user_id: &str) -> String {
    format!(
        "users/{}/moments/thumbnails/{}",
        user_id,
        object_file_name("jpg")
    )
}

/// Object name for a prepared video under the user's moments tree.
pub fn video_object_name(user_id: &str) -> String {
    format!(
        "users/{}/moments/videos/{}",
        user_id,
        object_file_name("mp4")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_names_are_scoped_to_user() {
        let name = thumbnail_object_name("u1");
        assert!(name.starts_with("users/u1/moments/thumbnails/"));
        assert!(name.ends_with(".jpg"));

        let name = video_object_name("u1");
        assert!(name.starts_with("users/u1/moments/videos/"));
        assert!(name.ends_with(".mp4"));
    }

    #[test]
    fn test_object_names_are_unique() {
        assert_ne!(video_object_name("u1"), video_object_name("u1"));
    }
}
