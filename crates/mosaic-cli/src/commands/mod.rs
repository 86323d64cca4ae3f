pub mod deps;
pub mod snap;
pub mod status;
