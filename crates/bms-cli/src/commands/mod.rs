pub mod loans;
pub mod portal;
pub mod session;
