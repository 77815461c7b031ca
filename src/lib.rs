/// Build-configuration-aware compilation database resolution for CMake workspaces
pub mod compdb;
pub mod config;
pub mod error;
pub mod exit_code;
pub mod logging;
pub mod toolchain;

// Explicit exports for better API clarity
pub use compdb::{
    ActiveConfigurationResolver, BuildSettingsLocator, CompilationDatabaseEntry,
    CompilationDatabaseLocator, CompilationEntryResolver, EvaluationContext, FileKind,
    FixedWorkspaceRoot, LocateOutcome, MacroEvaluationEngine, StableId, WorkspaceRootProvider,
    classify, stable_id,
};
pub use config::Settings;
pub use error::{ResolutionError, ResolutionResult, ToolchainError, ToolchainResult};
pub use exit_code::ExitCode;
pub use toolchain::{ToolchainEnvironmentProvider, ToolchainEnvironmentSnapshot};
