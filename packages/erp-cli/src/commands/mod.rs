pub mod demo;
pub mod events;
pub mod info;
pub mod validate;
