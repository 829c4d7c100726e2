pub mod cv;
pub mod scan;
pub mod score;
pub mod user;
