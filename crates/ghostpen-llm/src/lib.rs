pub mod converter;
pub mod mock;
pub mod models;
pub mod provider;

pub use provider::AnthropicProvider;
