use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::types::{Audit, EntityKind};

status_enum! {
    ForecastStatus {
        Draft => "draft",
        Generated => "generated",
        UnderReview => "under_review",
        Approved => "approved",
        Archived => "archived",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub method: String,
    pub status: ForecastStatus,
    #[serde(flatten)]
    pub audit: Audit,
}

impl Entity for Forecast {
    const KIND: EntityKind = EntityKind::Forecast;

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        format!("{} ({} .. {})", self.name, self.period_start, self.period_end)
    }

    fn status(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }
}
