//! Which actions to offer for an entity, by status. The server still decides.

use serde::{Deserialize, Serialize};

use crate::types::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Edit,
    Delete,
    Submit,
    Approve,
    Reject,
    Send,
    Receive,
    Cancel,
    Close,
    Convert,
    Publish,
    Evaluate,
    Award,
    Terminate,
    Renew,
    Suspend,
    Reactivate,
    Blacklist,
    Activate,
    Deactivate,
    ResendInvite,
    Adjust,
    Discontinue,
    Generate,
    Archive,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Submit => "submit",
            Action::Approve => "approve",
            Action::Reject => "reject",
            Action::Send => "send",
            Action::Receive => "receive",
            Action::Cancel => "cancel",
            Action::Close => "close",
            Action::Convert => "convert",
            Action::Publish => "publish",
            Action::Evaluate => "evaluate",
            Action::Award => "award",
            Action::Terminate => "terminate",
            Action::Renew => "renew",
            Action::Suspend => "suspend",
            Action::Reactivate => "reactivate",
            Action::Blacklist => "blacklist",
            Action::Activate => "activate",
            Action::Deactivate => "deactivate",
            Action::ResendInvite => "resend_invite",
            Action::Adjust => "adjust",
            Action::Discontinue => "discontinue",
            Action::Generate => "generate",
            Action::Archive => "archive",
        }
    }

    /// Path segment of the transition endpoint, `POST /{collection}/{id}/{segment}`
    pub fn path_segment(&self) -> String {
        self.as_str().replace('_', "-")
    }

    /// View, edit and delete map onto plain reads and writes
    pub fn is_transition(&self) -> bool {
        !matches!(self, Action::View | Action::Edit | Action::Delete)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.trim().to_ascii_lowercase().replace('-', "_")))
            .map_err(|_| format!("Unknown action '{}'", s))
    }
}

use Action::*;

type Row = (EntityKind, &'static str, &'static [Action]);

static TABLE: &[Row] = &[
    (EntityKind::Requisition, "draft", &[Edit, Delete, Submit]),
    (EntityKind::Requisition, "pending", &[Approve, Reject]),
    (EntityKind::Requisition, "approved", &[Convert, Cancel]),
    (EntityKind::Requisition, "rejected", &[Edit, Delete]),
    (EntityKind::Requisition, "converted", &[]),
    (EntityKind::Requisition, "cancelled", &[]),

    (EntityKind::PurchaseOrder, "draft", &[Edit, Delete, Submit]),
    (EntityKind::PurchaseOrder, "pending", &[Approve, Reject]),
    (EntityKind::PurchaseOrder, "approved", &[Send, Cancel]),
    (EntityKind::PurchaseOrder, "rejected", &[Edit, Delete]),
    (EntityKind::PurchaseOrder, "sent", &[Receive, Cancel]),
    (EntityKind::PurchaseOrder, "partially_received", &[Receive, Close]),
    (EntityKind::PurchaseOrder, "received", &[Close]),
    (EntityKind::PurchaseOrder, "cancelled", &[]),
    (EntityKind::PurchaseOrder, "closed", &[]),

    (EntityKind::Supplier, "pending", &[Edit, Delete, Approve]),
    (EntityKind::Supplier, "active", &[Edit, Suspend, Blacklist]),
    (EntityKind::Supplier, "suspended", &[Reactivate, Blacklist]),
    (EntityKind::Supplier, "blacklisted", &[]),
    (EntityKind::Supplier, "inactive", &[Reactivate, Delete]),

    (EntityKind::Rfx, "draft", &[Edit, Delete, Publish]),
    (EntityKind::Rfx, "published", &[Evaluate, Cancel]),
    (EntityKind::Rfx, "evaluation", &[Award, Cancel]),
    (EntityKind::Rfx, "awarded", &[Close]),
    (EntityKind::Rfx, "cancelled", &[]),
    (EntityKind::Rfx, "closed", &[]),

    (EntityKind::Contract, "draft", &[Edit, Delete, Submit]),
    (EntityKind::Contract, "pending_approval", &[Approve]),
    (EntityKind::Contract, "active", &[Terminate, Renew]),
    (EntityKind::Contract, "expired", &[Renew]),
    (EntityKind::Contract, "terminated", &[]),
    (EntityKind::Contract, "renewed", &[]),

    (EntityKind::User, "invited", &[ResendInvite, Delete]),
    (EntityKind::User, "active", &[Edit, Suspend, Deactivate]),
    (EntityKind::User, "suspended", &[Activate, Deactivate]),
    (EntityKind::User, "deactivated", &[Activate, Delete]),

    (EntityKind::InventoryItem, "active", &[Edit, Adjust, Discontinue]),
    (EntityKind::InventoryItem, "out_of_stock", &[Edit, Adjust, Discontinue]),
    (EntityKind::InventoryItem, "discontinued", &[Delete]),

    (EntityKind::Warehouse, "active", &[Edit, Deactivate]),
    (EntityKind::Warehouse, "inactive", &[Activate, Delete]),
    (EntityKind::Warehouse, "maintenance", &[Edit, Activate]),

    (EntityKind::Forecast, "draft", &[Edit, Delete, Generate]),
    (EntityKind::Forecast, "generated", &[Edit, Submit]),
    (EntityKind::Forecast, "under_review", &[Approve, Reject]),
    (EntityKind::Forecast, "approved", &[Archive]),
    (EntityKind::Forecast, "archived", &[]),
];

/// Actions offered for one `(kind, status)` pair. `View` is always offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSet {
    actions: &'static [Action],
}

impl ActionSet {
    pub const NONE: ActionSet = ActionSet { actions: &[] };

    pub fn can(&self, action: Action) -> bool {
        action == View || self.actions.contains(&action)
    }

    /// Offered actions in menu order, `View` first
    pub fn actions(&self) -> Vec<Action> {
        std::iter::once(View).chain(self.actions.iter().copied()).collect()
    }

    pub fn can_edit(&self) -> bool {
        self.can(Edit)
    }

    pub fn can_delete(&self) -> bool {
        self.can(Delete)
    }
}

/// Look up the actions for an entity in the given status. Unknown statuses
/// offer nothing beyond `View`.
pub fn permitted(kind: EntityKind, status: &str) -> ActionSet {
    TABLE
        .iter()
        .find(|(k, s, _)| *k == kind && *s == status)
        .map(|(_, _, actions)| ActionSet { actions })
        .unwrap_or(ActionSet::NONE)
}

/// Every status transition a kind exposes, in first-seen order
pub fn transitions(kind: EntityKind) -> Vec<Action> {
    let mut found = Vec::new();
    for (_, _, actions) in TABLE.iter().filter(|(k, _, _)| *k == kind) {
        for action in actions.iter().filter(|a| a.is_transition()) {
            if !found.contains(action) {
                found.push(*action);
            }
        }
    }
    found
}

/// Statuses the table knows for a kind
pub fn statuses(kind: EntityKind) -> Vec<&'static str> {
    TABLE.iter().filter(|(k, _, _)| *k == kind).map(|(_, s, _)| *s).collect()
}
