//! Fine-grained capability flags granted by a mandate
//!
//! The permission record is a fixed-shape struct rather than a keyed map:
//! an unknown capability is a compile error, not a runtime surprise, and a
//! mandate's grant can be audited field by field.

use serde::{Deserialize, Serialize};

/// A single capability an actor may request on a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewProperties,
    EditProperties,
    CreateProperties,
    DeleteProperties,
    ViewApplications,
    ManageApplications,
    CreateLeases,
    ViewFinancials,
    ManageMaintenance,
    CommunicateWithTenants,
    ManageDocuments,
}

/// The full permission record carried by a mandate.
///
/// One boolean per capability. Resolution returns a whole record verbatim
/// from a single mandate; records are never merged across mandates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissionSet {
    pub can_view_properties: bool,
    pub can_edit_properties: bool,
    pub can_create_properties: bool,
    pub can_delete_properties: bool,
    pub can_view_applications: bool,
    pub can_manage_applications: bool,
    pub can_create_leases: bool,
    pub can_view_financials: bool,
    pub can_manage_maintenance: bool,
    pub can_communicate_with_tenants: bool,
    pub can_manage_documents: bool,
}

impl PermissionSet {
    /// A record granting nothing
    pub fn none() -> Self {
        Self::default()
    }

    /// A record granting every capability
    pub fn full() -> Self {
        Self {
            can_view_properties: true,
            can_edit_properties: true,
            can_create_properties: true,
            can_delete_properties: true,
            can_view_applications: true,
            can_manage_applications: true,
            can_create_leases: true,
            can_view_financials: true,
            can_manage_maintenance: true,
            can_communicate_with_tenants: true,
            can_manage_documents: true,
        }
    }

    /// A read-only record: view flags set, mutating flags clear
    pub fn read_only() -> Self {
        Self {
            can_view_properties: true,
            can_view_applications: true,
            can_view_financials: true,
            ..Self::default()
        }
    }

    /// Whether this record grants the requested capability
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::ViewProperties => self.can_view_properties,
            Capability::EditProperties => self.can_edit_properties,
            Capability::CreateProperties => self.can_create_properties,
            Capability::DeleteProperties => self.can_delete_properties,
            Capability::ViewApplications => self.can_view_applications,
            Capability::ManageApplications => self.can_manage_applications,
            Capability::CreateLeases => self.can_create_leases,
            Capability::ViewFinancials => self.can_view_financials,
            Capability::ManageMaintenance => self.can_manage_maintenance,
            Capability::CommunicateWithTenants => self.can_communicate_with_tenants,
            Capability::ManageDocuments => self.can_manage_documents,
        }
    }
}
