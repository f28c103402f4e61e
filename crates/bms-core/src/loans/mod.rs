pub mod emi;
pub mod summary;
pub mod validation;
