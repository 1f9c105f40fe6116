use serde::{Deserialize, Serialize};
use crate::core::domain::Identifiable;
use crate::users::User;

// UserDto abstracts a library member. The password is an opaque credential and
// is never serialized.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub is_admin: bool,
    pub borrowed_books: Vec<String>,
}

impl UserDto {
    pub fn new(username: &str, password: &str, is_admin: bool) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            is_admin,
            borrowed_books: vec![],
        }
    }

    pub(crate) fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

impl Identifiable for UserDto {
    fn id(&self) -> String {
        self.username.to_string()
    }
}

impl User for UserDto {
    fn is_admin(&self) -> bool {
        self.is_admin
    }

    fn has_borrowed(&self, book_id: &str) -> bool {
        self.borrowed_books.iter().any(|b| b == book_id)
    }
}
