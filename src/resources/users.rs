use serde::{Deserialize, Serialize};

use super::Entity;
use crate::types::{Audit, EntityKind};

status_enum! {
    UserStatus {
        Invited => "invited",
        Active => "active",
        Suspended => "suspended",
        Deactivated => "deactivated",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub tenant_id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: String,
    pub status: UserStatus,
    #[serde(flatten)]
    pub audit: Audit,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        match self.full_name().as_str() {
            "" => self.email.clone(),
            name => format!("{} <{}>", name, self.email),
        }
    }

    fn status(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }
}
