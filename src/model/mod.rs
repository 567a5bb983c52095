pub mod attendance;
pub mod worker;
