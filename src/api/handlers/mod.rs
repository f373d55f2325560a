pub mod agents;
pub mod health;
pub mod orchestration;
pub mod runs;
pub mod telegram;
