//! Generative-text features.
//!
//! The client ([`GenClient`]) is a thin boundary over the hosted text API
//! and returns explicit results. The feature layer ([`devotional`],
//! [`summarize`], [`pastoral_reply`]) applies the fallback policy: a failed
//! call degrades to a hardcoded, domain-appropriate substitute and is never
//! surfaced to the caller as an error.

mod client;
mod devotional;

pub use client::{GenClient, GenError, API_KEY_ENV};
pub use devotional::{
    daily_devotional, fallback_devotional, pastoral_reply, summarize, Devotional,
    FALLBACK_PASTORAL_REPLY,
};
