pub mod clock;
pub mod countdown;
pub mod location;
pub mod ramadan;
pub mod session;
pub mod task;
pub mod weather;
