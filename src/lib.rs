//! CharlaBot Entitlements - Trial and Subscription Engine
//!
//! This crate decides, for any CharlaBot user, whether they are allowed to
//! use the tutor right now. It tracks trial lifecycles, reconciles
//! subscription state arriving from PayPal webhooks, and links payment
//! emails to Telegram user ids.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
