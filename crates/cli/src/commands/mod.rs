pub mod chat;
pub mod onboard;
pub mod resolve;
pub mod rotate;
pub mod serve;
