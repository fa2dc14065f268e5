pub mod compile;
pub mod docs;
pub mod inventory;
pub mod stage;
pub mod status;
