mod client;
mod error;
mod multipart;

pub use client::HttpNode;
