use serde::{Deserialize, Serialize};

/// JWT claims issued by the auth provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    pub exp: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
    pub is_admin: bool,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            is_admin: claims.is_admin,
        }
    }
}
