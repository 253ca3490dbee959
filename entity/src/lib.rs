//! Record types for the employee directory.

pub mod employee;

pub use employee::{Employee, EmployeeField, EmployeeFields, EmployeeId, UnknownField};
