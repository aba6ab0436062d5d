//! brusio — a small social blogging service.
//!
//! Users author text posts, optionally filed under a group and carrying an
//! image; readers comment on posts and follow authors to curate a personal
//! feed. The crate is a thin layer of request handlers, form validation, and
//! template rendering over Postgres, with a short-TTL page cache in front of
//! the global feed.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
