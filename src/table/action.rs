//! Row, header, and bulk actions gated by permissions.
//!
//! The engine never performs the work behind an action. It only decides
//! which actions are offered and hands the row(s) to the caller's callback.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Flags gating which affordances a table offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Permissions {
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_view: bool,
    pub can_export: bool,
    pub can_add: bool,
    pub can_manage_columns: bool,
}

impl Permissions {
    /// Every flag set.
    pub fn all() -> Self {
        Self {
            can_edit: true,
            can_delete: true,
            can_view: true,
            can_export: true,
            can_add: true,
            can_manage_columns: true,
        }
    }

    /// View and export only.
    pub fn read_only() -> Self {
        Self {
            can_view: true,
            can_export: true,
            ..Self::default()
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::Edit => self.can_edit,
            Permission::Delete => self.can_delete,
            Permission::View => self.can_view,
            Permission::Export => self.can_export,
            Permission::Add => self.can_add,
            Permission::ManageColumns => self.can_manage_columns,
        }
    }

    /// `None` means the affordance is always allowed.
    pub fn allows_opt(&self, permission: Option<Permission>) -> bool {
        permission.is_none_or(|p| self.allows(p))
    }
}

/// A single permission flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Edit,
    Delete,
    View,
    Export,
    Add,
    ManageColumns,
}

/// Visual weight of an action button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionVariant {
    Primary,
    #[default]
    Secondary,
    Danger,
    Ghost,
}

/// What a row action does, which decides the permission it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowActionKind {
    View,
    Edit,
    Delete,
    /// Custom action, optionally gated by a permission.
    Custom(Option<Permission>),
}

impl RowActionKind {
    pub fn required(&self) -> Option<Permission> {
        match self {
            RowActionKind::View => Some(Permission::View),
            RowActionKind::Edit => Some(Permission::Edit),
            RowActionKind::Delete => Some(Permission::Delete),
            RowActionKind::Custom(p) => *p,
        }
    }
}

/// What a header action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderActionKind {
    Add,
    Export,
    Refresh,
    Custom(Option<Permission>),
}

impl HeaderActionKind {
    pub fn required(&self) -> Option<Permission> {
        match self {
            HeaderActionKind::Add => Some(Permission::Add),
            HeaderActionKind::Export => Some(Permission::Export),
            HeaderActionKind::Refresh => None,
            HeaderActionKind::Custom(p) => *p,
        }
    }
}

/// Callback invoked with one row.
pub type RowCallback<R> = Arc<dyn Fn(&R) + Send + Sync>;
/// Callback invoked with the selected rows.
pub type BulkCallback<R> = Arc<dyn Fn(&[&R]) + Send + Sync>;
/// Callback invoked without arguments.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Label and presentation shared by all action types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLabel {
    pub id: String,
    pub label: String,
    pub icon: Option<String>,
    pub variant: ActionVariant,
}

impl ActionLabel {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: None,
            variant: ActionVariant::default(),
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn variant(mut self, variant: ActionVariant) -> Self {
        self.variant = variant;
        self
    }
}

/// An action offered on each row.
pub struct RowAction<R> {
    pub label: ActionLabel,
    pub kind: RowActionKind,
    pub on_click: RowCallback<R>,
}

impl<R> RowAction<R> {
    pub fn new<F>(label: ActionLabel, kind: RowActionKind, on_click: F) -> Self
    where
        F: Fn(&R) + Send + Sync + 'static,
    {
        Self {
            label,
            kind,
            on_click: Arc::new(on_click),
        }
    }

    pub fn id(&self) -> &str {
        &self.label.id
    }

    pub fn permitted(&self, permissions: &Permissions) -> bool {
        permissions.allows_opt(self.kind.required())
    }
}

impl<R> fmt::Debug for RowAction<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowAction")
            .field("label", &self.label)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// An action offered in the table header (add, export, refresh).
pub struct HeaderAction {
    pub label: ActionLabel,
    pub kind: HeaderActionKind,
    pub on_click: Callback,
}

impl HeaderAction {
    pub fn new<F>(label: ActionLabel, kind: HeaderActionKind, on_click: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            label,
            kind,
            on_click: Arc::new(on_click),
        }
    }

    pub fn id(&self) -> &str {
        &self.label.id
    }

    pub fn permitted(&self, permissions: &Permissions) -> bool {
        permissions.allows_opt(self.kind.required())
    }
}

impl fmt::Debug for HeaderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderAction")
            .field("label", &self.label)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// An action applied to every selected row at once.
pub struct BulkAction<R> {
    pub label: ActionLabel,
    pub required: Option<Permission>,
    pub on_click: BulkCallback<R>,
}

impl<R> BulkAction<R> {
    pub fn new<F>(label: ActionLabel, required: Option<Permission>, on_click: F) -> Self
    where
        F: Fn(&[&R]) + Send + Sync + 'static,
    {
        Self {
            label,
            required,
            on_click: Arc::new(on_click),
        }
    }

    pub fn id(&self) -> &str {
        &self.label.id
    }

    pub fn permitted(&self, permissions: &Permissions) -> bool {
        permissions.allows_opt(self.required)
    }
}

impl<R> fmt::Debug for BulkAction<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkAction")
            .field("label", &self.label)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_action_gating() {
        let perms = Permissions {
            can_view: true,
            ..Default::default()
        };
        let view: RowAction<()> =
            RowAction::new(ActionLabel::new("view", "View"), RowActionKind::View, |_| {});
        let delete: RowAction<()> =
            RowAction::new(ActionLabel::new("delete", "Delete"), RowActionKind::Delete, |_| {});
        let custom: RowAction<()> = RowAction::new(
            ActionLabel::new("qr", "Print QR"),
            RowActionKind::Custom(None),
            |_| {},
        );
        assert!(view.permitted(&perms));
        assert!(!delete.permitted(&perms));
        assert!(custom.permitted(&perms));
    }

    #[test]
    fn test_header_action_gating() {
        let perms = Permissions::read_only();
        let add = HeaderAction::new(ActionLabel::new("add", "Add"), HeaderActionKind::Add, || {});
        let refresh =
            HeaderAction::new(ActionLabel::new("refresh", "Refresh"), HeaderActionKind::Refresh, || {});
        let export =
            HeaderAction::new(ActionLabel::new("export", "Export"), HeaderActionKind::Export, || {});
        assert!(!add.permitted(&perms));
        assert!(refresh.permitted(&perms));
        assert!(export.permitted(&perms));
        assert!(!export.permitted(&Permissions::default()));
    }

    #[test]
    fn test_permissions_deserialize_partial() {
        let perms: Permissions = serde_json::from_str(r#"{"canEdit":true}"#).unwrap();
        assert!(perms.can_edit);
        assert!(!perms.can_delete);
    }
}
