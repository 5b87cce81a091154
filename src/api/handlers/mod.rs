pub mod auth;
pub mod otp;
pub mod payments;
pub mod root;
