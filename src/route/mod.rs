pub mod auth;
pub mod docs;
pub mod follow;
pub mod model;
pub mod posts;
