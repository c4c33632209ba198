pub mod accessibility;
pub mod economy;
pub mod scheduler;
pub mod scoring;
pub mod timer;
