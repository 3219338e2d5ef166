pub mod class;
pub mod student;
