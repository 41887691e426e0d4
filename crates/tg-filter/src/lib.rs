pub mod decision;
pub mod filter;

pub use decision::{AllowReason, Decision, DenyReason};
pub use filter::AdmissionFilter;
