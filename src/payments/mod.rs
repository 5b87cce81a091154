pub mod gateway;

pub use gateway::SignatureVerifier;
