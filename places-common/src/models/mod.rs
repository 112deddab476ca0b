pub mod friend_request;
pub mod friendship;
pub mod user;
pub mod user_location;
