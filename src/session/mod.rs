pub mod controller;
pub mod events;
pub mod result;
pub mod round;
