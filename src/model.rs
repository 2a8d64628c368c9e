use serde::{Deserialize, Serialize};

/// Lifecycle state of a single draft within its weekly batch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DraftStatus {
    Pending,
    Selected,
    Rejected,
}

impl DraftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::Pending => "pending",
            DraftStatus::Selected => "selected",
            DraftStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DraftStatus::Pending),
            "selected" => Some(DraftStatus::Selected),
            "rejected" => Some(DraftStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NotificationKind {
    Initial,
    Reminder,
    AutoConfirm,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Initial => "initial",
            NotificationKind::Reminder => "reminder",
            NotificationKind::AutoConfirm => "auto_confirm",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NotificationStatus {
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
        }
    }
}

/// Customer account with its content-generation profile. Rows are created and
/// deactivated by an external admin surface; this service only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub business_type: Option<String>,
    pub keywords: Vec<String>,
    pub tone: Option<String>,
    pub specialty: Option<String>,
    pub target_audience: Option<String>,
    pub brand_concept: Option<String>,
    pub main_services: Vec<String>,
    pub price_range: Option<String>,
    pub location_info: Option<String>,
    pub preferred_expressions: Vec<String>,
    pub avoided_expressions: Vec<String>,
    pub confirm_token: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub id: i64,
    pub customer_id: i64,
    pub week_of: String,
    pub title: String,
    pub content: String,
    pub main_keyword: Option<String>,
    pub status: DraftStatus,
}

/// One draft as returned by the generation collaborator, before persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedDraft {
    pub title: String,
    pub content: String,
    pub main_keyword: Option<String>,
}
