use sea_orm::entity::prelude::*;

/// Role of a staff account; mirrors `common::Role` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum UserRole {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "registrar")]
    Registrar,
    #[sea_orm(string_value = "accountant")]
    Accountant,
    #[sea_orm(string_value = "viewer")]
    Viewer,
}

impl From<UserRole> for common::Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => common::Role::Admin,
            UserRole::Registrar => common::Role::Registrar,
            UserRole::Accountant => common::Role::Accountant,
            UserRole::Viewer => common::Role::Viewer,
        }
    }
}

impl From<common::Role> for UserRole {
    fn from(role: common::Role) -> Self {
        match role {
            common::Role::Admin => UserRole::Admin,
            common::Role::Registrar => UserRole::Registrar,
            common::Role::Accountant => UserRole::Accountant,
            common::Role::Viewer => UserRole::Viewer,
        }
    }
}

/// A staff member who can sign in to the administration API.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    /// bcrypt hash, never serialized.
    pub password_hash: String,
    pub role: UserRole,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
    /// Single-use token issued by the forgot-password flow.
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
