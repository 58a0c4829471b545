// src/models/role.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Papéis do sistema, mapeados para o enum `user_role` do banco.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Agent,
    CallCenter,
    // Clientes antigos ainda enviam "work"
    #[serde(alias = "work")]
    Technician,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Agent,
        Role::CallCenter,
        Role::Technician,
    ];

    pub fn rank(self) -> u8 {
        match self {
            Role::SuperAdmin => 4,
            Role::Admin => 3,
            Role::Agent | Role::CallCenter => 2,
            Role::Technician => 1,
        }
    }

    /// Tabela de criação: quais papéis cada papel pode criar.
    pub fn allowed_creates(self) -> &'static [Role] {
        match self {
            Role::SuperAdmin => &[Role::Admin],
            Role::Admin => &[Role::Agent, Role::CallCenter, Role::Technician],
            Role::Agent => &[Role::Technician],
            Role::CallCenter | Role::Technician => &[],
        }
    }

    pub fn can_create(self, target: Role) -> bool {
        self.allowed_creates().contains(&target)
    }

    /// Hierarquia estrita: agent e call_center têm o mesmo nível e não se gerenciam.
    pub fn outranks(self, other: Role) -> bool {
        self.rank() > other.rank()
    }

    pub fn is_tenant_global(self) -> bool {
        self == Role::SuperAdmin
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Agent => "agent",
            Role::CallCenter => "call_center",
            Role::Technician => "technician",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_table_matches_hierarchy() {
        for creator in Role::ALL {
            for target in Role::ALL {
                if creator.can_create(target) {
                    assert!(creator.outranks(target), "{creator} cria {target}");
                }
            }
        }
    }

    #[test]
    fn agent_creates_only_technicians() {
        assert!(Role::Agent.can_create(Role::Technician));
        assert!(!Role::Agent.can_create(Role::Admin));
        assert!(!Role::Agent.can_create(Role::CallCenter));
    }

    #[test]
    fn leaf_roles_create_nothing() {
        assert!(Role::CallCenter.allowed_creates().is_empty());
        assert!(Role::Technician.allowed_creates().is_empty());
    }

    #[test]
    fn super_admin_creates_admins_only() {
        assert!(Role::SuperAdmin.can_create(Role::Admin));
        assert!(!Role::SuperAdmin.can_create(Role::Technician));
        assert!(Role::SuperAdmin.is_tenant_global());
        assert!(!Role::Admin.is_tenant_global());
    }

    #[test]
    fn peers_do_not_outrank_each_other() {
        assert!(!Role::Agent.outranks(Role::CallCenter));
        assert!(!Role::CallCenter.outranks(Role::Agent));
        assert!(Role::Admin.outranks(Role::Agent));
    }

    #[test]
    fn legacy_work_alias_deserializes_to_technician() {
        let role: Role = serde_json::from_str("\"work\"").unwrap();
        assert_eq!(role, Role::Technician);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"technician\"");
    }
}
