use serde::Serialize;

use stechuhr_db::user::models::User;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    /// True when the user has no PIN yet and must set one before logging in.
    pub first_login: bool,
}
