//! Role-based access control: the static permission table

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use filedock_db::UserRole;

/// Operations a role can be granted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    FilesRead,
    FilesWrite,
    FilesDelete,
    AnalyticsRead,
}

impl Permission {
    pub const ALL: [Permission; 4] = [
        Permission::FilesRead,
        Permission::FilesWrite,
        Permission::FilesDelete,
        Permission::AnalyticsRead,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::FilesRead => "files:read",
            Permission::FilesWrite => "files:write",
            Permission::FilesDelete => "files:delete",
            Permission::AnalyticsRead => "analytics:read",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "files:read" => Ok(Permission::FilesRead),
            "files:write" => Ok(Permission::FilesWrite),
            "files:delete" => Ok(Permission::FilesDelete),
            "analytics:read" => Ok(Permission::AnalyticsRead),
            _ => Err(()),
        }
    }
}

/// Check whether a role is granted a permission
///
/// Admin holds the wildcard. The match is exhaustive over the closed
/// role set, so adding a role forces a decision here.
pub fn has_permission(role: UserRole, permission: Permission) -> bool {
    match role {
        UserRole::Admin => true,
        UserRole::Editor => matches!(
            permission,
            Permission::FilesRead
                | Permission::FilesWrite
                | Permission::FilesDelete
                | Permission::AnalyticsRead
        ),
        UserRole::Viewer => matches!(
            permission,
            Permission::FilesRead | Permission::AnalyticsRead
        ),
        UserRole::ExternalViewer => matches!(permission, Permission::FilesRead),
    }
}

/// Access rule descriptor for the admin panel
#[derive(Debug, Clone, Serialize)]
pub struct AccessRule {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

/// Catalog of access rule types shown in the admin panel
pub fn access_rules() -> &'static [AccessRule] {
    &[
        AccessRule {
            id: "files:read",
            label: "Read / List",
            description: "View and list files and folders",
        },
        AccessRule {
            id: "files:write",
            label: "Upload",
            description: "Upload files",
        },
        AccessRule {
            id: "files:delete",
            label: "Delete",
            description: "Delete files",
        },
        AccessRule {
            id: "analytics:read",
            label: "Analytics",
            description: "View analytics and activity trends",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_every_permission() {
        for permission in Permission::ALL {
            assert!(has_permission(UserRole::Admin, permission));
        }
    }

    #[test]
    fn test_table_matches_static_mapping() {
        let cases = [
            (UserRole::Editor, Permission::FilesRead, true),
            (UserRole::Editor, Permission::FilesWrite, true),
            (UserRole::Editor, Permission::FilesDelete, true),
            (UserRole::Editor, Permission::AnalyticsRead, true),
            (UserRole::Viewer, Permission::FilesRead, true),
            (UserRole::Viewer, Permission::FilesWrite, false),
            (UserRole::Viewer, Permission::FilesDelete, false),
            (UserRole::Viewer, Permission::AnalyticsRead, true),
            (UserRole::ExternalViewer, Permission::FilesRead, true),
            (UserRole::ExternalViewer, Permission::FilesWrite, false),
            (UserRole::ExternalViewer, Permission::FilesDelete, false),
            (UserRole::ExternalViewer, Permission::AnalyticsRead, false),
        ];
        for (role, permission, expected) in cases {
            assert_eq!(
                has_permission(role, permission),
                expected,
                "{:?} / {}",
                role,
                permission
            );
        }
    }

    #[test]
    fn test_permission_wire_names() {
        for permission in Permission::ALL {
            assert_eq!(permission.as_str().parse::<Permission>(), Ok(permission));
        }
        assert!("files:admin".parse::<Permission>().is_err());
    }
}
