pub mod gym;
pub mod otp;
pub mod payment;
pub mod user;

pub use gym::*;
pub use otp::*;
pub use payment::*;
pub use user::*;

/// Identity the caller is acting as. Every OTP/payment operation takes this
/// explicitly instead of reading ambient session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorContext {
    pub user_id: i64,
    pub gym_id: i64,
}

impl ActorContext {
    pub fn new(user_id: i64, gym_id: i64) -> Self {
        Self { user_id, gym_id }
    }
}
