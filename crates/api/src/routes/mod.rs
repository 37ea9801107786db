pub mod frames;
pub mod measurements;
pub mod posture;
pub mod reference;
pub mod session;
