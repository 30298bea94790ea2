pub mod enrollment;
pub mod order;
pub mod path;
pub mod payment;
pub mod progress;
