//! SDK client: builder, request plumbing and per-resource handles.

mod builder;
mod core;
mod resource;

pub use builder::SdkClientBuilder;
pub use core::SdkClient;
pub use resource::{Resource, ResourceClient};
