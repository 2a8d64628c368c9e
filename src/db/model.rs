//! Query-shaped view models. Keep these focused on the data returned by
//! repositories; lifecycle decisions live in higher layers.

/// Prior published topic, consulted when building generation exclusions.
#[derive(Debug, Clone)]
pub struct UsedTopic {
    pub title: String,
    pub summary: Option<String>,
}
