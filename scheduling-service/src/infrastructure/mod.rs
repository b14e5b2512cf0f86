pub mod circuit_breaker;
pub mod client;
pub mod forecast;
pub mod health_check;
pub mod labor;
pub mod notification;
pub mod schedule;
pub mod swap;
