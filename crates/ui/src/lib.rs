#![deny(unsafe_code)]

/// Window shell with the transcript actions.
pub mod app;
/// Chat components built on gpui-component.
pub mod chat;
pub mod theme;
