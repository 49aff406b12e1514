pub mod authorization;
pub mod email;
pub mod hashing;
pub mod identity;
pub mod jwt;
pub mod security;
pub mod tokens;
pub mod webhook;
