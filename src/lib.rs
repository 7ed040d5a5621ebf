//! Lending Server Library
//!
//! This library exports the core modules for the lending backend: trust
//! tiers and vouching, lender policies and matching, loan requests,
//! repayment schedules and notifications.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod loan;
pub mod middleware;
pub mod models;
pub mod notification;
pub mod payment;
pub mod policy;
pub mod routes;
pub mod services;
pub mod state;
pub mod trust;
pub mod vouch;
