pub mod admin;
pub mod results;
pub mod vote;
