pub mod knowledge;
pub mod page;
pub mod search;
pub mod source;
pub mod timestamp;
pub mod user;
