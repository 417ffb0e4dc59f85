pub mod auth;
pub mod plant;
pub mod profile;
pub mod reminder;
pub mod tracked_plant;
pub mod users;
