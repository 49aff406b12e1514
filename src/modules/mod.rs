pub mod access;
pub mod auth;
pub mod devices;
pub mod response;
pub mod users;
pub mod webhooks;
