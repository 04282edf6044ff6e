pub mod blacklist;
pub mod producer;
pub mod synthesizer;

pub use blacklist::{generate_blacklist, Blacklist};
pub use producer::Producer;
pub use synthesizer::TransactionSynthesizer;
