pub mod booking;
pub mod request;
pub mod resource;
pub mod slots;
