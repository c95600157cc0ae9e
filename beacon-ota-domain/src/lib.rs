pub mod firmware;
pub mod request;
pub mod uptime;
