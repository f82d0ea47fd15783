//! Route handlers

pub mod alerts;
pub mod individuals;
pub mod readings;
pub mod risk;
