pub mod admin;
pub mod comments;
pub mod health;
pub mod issues;
pub mod notifications;
pub mod profile;
pub mod tags;
