//! Privilege descriptors: turning privileges into permission text

use crate::model::Privilege;

/// Builds permission text for one privilege type
pub trait PrivilegeDescriptor: Send + Sync {
    /// Privilege type this descriptor handles
    fn privilege_type(&self) -> &str;

    /// Permission text for `privilege`, or `None` if it grants nothing
    fn build_permission(&self, privilege: &Privilege) -> Option<String>;
}

/// `method` privileges: `{permission}:{method}`
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodPrivilegeDescriptor;

impl MethodPrivilegeDescriptor {
    pub const TYPE: &'static str = "method";
}

impl PrivilegeDescriptor for MethodPrivilegeDescriptor {
    fn privilege_type(&self) -> &str {
        Self::TYPE
    }

    fn build_permission(&self, privilege: &Privilege) -> Option<String> {
        let permission = privilege.property("permission")?;
        let method = privilege.property("method")?;
        Some(format!("{}:{}", permission, method))
    }
}

/// `target` privileges: `nexus:target:{target}:{repository}:{method}`
///
/// The repository is the repository id, else the group id, else `*`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetPrivilegeDescriptor;

impl TargetPrivilegeDescriptor {
    pub const TYPE: &'static str = "target";
}

impl PrivilegeDescriptor for TargetPrivilegeDescriptor {
    fn privilege_type(&self) -> &str {
        Self::TYPE
    }

    fn build_permission(&self, privilege: &Privilege) -> Option<String> {
        let target_id = privilege.property("repositoryTargetId")?;
        let method = privilege.property("method")?;

        let repository = [privilege.property("repositoryId"), privilege.property("repositoryGroupId")]
            .into_iter()
            .flatten()
            .find(|id| !id.is_empty())
            .unwrap_or("*");

        Some(format!("nexus:target:{}:{}:{}", target_id, repository, method))
    }
}

/// The built-in descriptors
pub fn default_descriptors() -> Vec<Box<dyn PrivilegeDescriptor>> {
    vec![
        Box::new(MethodPrivilegeDescriptor),
        Box::new(TargetPrivilegeDescriptor),
    ]
}
