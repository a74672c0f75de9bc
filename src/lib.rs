//! Headless point-of-sale checkout client.
//!
//! Scan -> cart -> stock-validate -> pay -> order, against a remote catalog
//! and order backend. The library owns the workflow and failure taxonomy; the
//! `pos` binary is a thin terminal driver.

pub mod admin;
pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod dto;
pub mod error;
pub mod invoice;
pub mod models;
pub mod stock;
pub mod storage;
