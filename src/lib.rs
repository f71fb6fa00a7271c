//! Folio: the content store and admin session layer of a markdown-backed blog.
//!
//! Request handlers, templates and asset serving live outside this crate and
//! talk to it through [`application::posts::PostRepository`],
//! [`domain::posts`] queries and [`application::sessions::SessionManager`].

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
