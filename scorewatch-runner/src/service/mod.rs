//! Service layer
//!
//! Services contain business logic for the runner. Each step of a run
//! (checkout, analysis, upload) and artifact retention is a service, and
//! the execution service sequences them.
//!
//! All services are trait-based to enable testing and dependency injection.

mod analysis;
mod archive;
mod checkout;
mod execution;
mod process;
mod upload;

// Re-export traits
pub use analysis::AnalysisService;
pub use archive::ArchiveService;
pub use checkout::CheckoutService;
pub use execution::ExecutionService;
pub use upload::UploadService;

// Re-export implementations
pub use analysis::ScorecardAnalysisService;
pub use archive::DirectoryArchiveService;
pub use checkout::GitCheckoutService;
pub use execution::StandardExecutionService;
pub use upload::HttpUploadService;

#[cfg(test)]
pub(crate) use execution::tests as mocks;
