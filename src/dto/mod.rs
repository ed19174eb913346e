pub mod bills;
pub mod orders;
pub mod tables;
pub mod wallet;
