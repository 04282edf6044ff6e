pub mod notification;
pub mod rules;

pub use notification::notify;
pub use rules::{classify, classify_batch, evaluate, ComplianceRule, ComplianceVerdict};
