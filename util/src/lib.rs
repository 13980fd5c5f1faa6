pub mod config;
pub mod dates;
pub mod otp;
pub mod state;
