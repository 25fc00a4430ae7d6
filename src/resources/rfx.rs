use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::types::{Audit, EntityKind};

status_enum! {
    RfxStatus {
        Draft => "draft",
        Published => "published",
        Evaluation => "evaluation",
        Awarded => "awarded",
        Cancelled => "cancelled",
        Closed => "closed",
    }
}

status_enum! {
    /// Request for information, proposal or quotation
    RfxKind {
        Rfi => "rfi",
        Rfp => "rfp",
        Rfq => "rfq",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfxEvent {
    pub id: String,
    pub tenant_id: String,
    pub number: String,
    pub title: String,
    pub kind: RfxKind,
    #[serde(default)]
    pub closes_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub invited_suppliers: Vec<String>,
    pub status: RfxStatus,
    #[serde(flatten)]
    pub audit: Audit,
}

impl RfxEvent {
    /// Still accepting responses at `now`
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == RfxStatus::Published && self.closes_at.map_or(true, |closes| now < closes)
    }
}

impl Entity for RfxEvent {
    const KIND: EntityKind = EntityKind::Rfx;

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        format!("{} {} {}", self.kind.as_str().to_uppercase(), self.number, self.title)
    }

    fn status(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }
}
