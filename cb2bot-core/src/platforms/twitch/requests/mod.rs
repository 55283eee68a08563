pub mod eventsub;
pub mod token;
pub mod users;
