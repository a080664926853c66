use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    /// Optional at the serde level so an empty JSON object reaches the
    /// handler and yields the documented 400 instead of an axum 422.
    #[serde(default)]
    pub url: Option<String>,
}
