pub mod candidate;
pub mod cast_vote;
pub mod reset;
pub mod roll;
pub mod validate;
