//! Login flow engine and token endpoint client

pub mod flow;
pub mod token_client;

pub use flow::{AuthFlowSettings, InpostAuthFlow};
pub use token_client::{request_tokens, InpostTokenClient};
