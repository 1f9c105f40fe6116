use crate::core::domain::Identifiable;
use crate::core::library::BookStatus;

pub mod dto;

pub trait Book: Identifiable {
    fn status(&self) -> BookStatus;

    fn is_available(&self) -> bool {
        self.status() == BookStatus::Available
    }
}
