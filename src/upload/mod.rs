// src/upload/mod.rs
//! Upload boundary
//!
//! - **Uploader**: async collaborator that delivers one batch per call
//! - **Context**: registry of providers enriching each payload

pub mod context;
pub mod uploader;

pub use context::{
    Context, ContextProvider, ContextRegistry, SdkContextProvider, StaticContextProvider,
};
pub use uploader::{LoggingUploader, UploadError, Uploader};
