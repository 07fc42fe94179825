use serde::{Deserialize, Serialize};

/// Authorization tier for a CRM user. Gates client affordances only; the
/// server is the authority on what a token may actually do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub disabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Signup payload for POST /users. Every field is required by the server.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// Profile update payload for PUT /users/{id}. Password and disabled are
/// only serialized when set, so an ordinary profile edit leaves them alone.
#[derive(Debug, Clone, Serialize)]
pub struct UserUpdate {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}
