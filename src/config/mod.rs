mod types;

pub use types::IssuerConfig;
