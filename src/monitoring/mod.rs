pub mod audit;

pub use audit::{AuditLog, AuditRecord};
