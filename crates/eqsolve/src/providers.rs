pub mod base;
pub mod configs;
pub mod openai;
pub mod sse;

#[cfg(any(test, feature = "mock"))]
pub mod mock;
