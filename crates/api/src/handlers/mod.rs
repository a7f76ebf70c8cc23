pub mod feedback;
pub mod uploads;
