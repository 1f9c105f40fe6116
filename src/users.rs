use crate::core::domain::Identifiable;

pub mod dto;

pub trait User: Identifiable {
    fn is_admin(&self) -> bool;
    fn has_borrowed(&self, book_id: &str) -> bool;
}
