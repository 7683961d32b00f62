//! Small helpers shared by front ends.

pub mod redirect;

pub use redirect::{safe_redirect, DEFAULT_REDIRECT};
