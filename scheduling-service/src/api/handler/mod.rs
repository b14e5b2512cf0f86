pub mod employee;
pub mod forecast;
pub mod labor;
pub mod optimizer;
pub mod schedule;
pub mod shift;
pub mod swap;
