pub mod user;
pub mod property;
pub mod booking;
pub mod payment;
pub mod pricing;

pub use user::*;
pub use property::*;
pub use booking::*;
pub use payment::*;
pub use pricing::{quote, taxes_and_fees, Quote};
