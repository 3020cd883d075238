use crate::error::EngineError;

/// External media-processing engine trait
///
/// The engine is a black box that works on named files inside a per-call
/// workspace. A handle returned by `load` must always be passed to `cleanup`,
/// including after a failed `write_input` / `execute` / `read_output`.
#[async_trait::async_trait]
pub trait MediaEngine: Send + Sync {
    /// Per-call workspace (temporary files, engine instance, ...)
    type Handle: Send + Sync + 'static;

    /// Initialise the engine and allocate a workspace
    async fn load(&self) -> Result<Self::Handle, EngineError>;

    /// Place input bytes in the workspace under `name`
    async fn write_input(
        &self,
        handle: &Self::Handle,
        name: &str,
        bytes: &[u8],
    ) -> Result<(), EngineError>;

    /// Run the engine with command-line style arguments
    async fn execute(&self, handle: &Self::Handle, args: &[String]) -> Result<(), EngineError>;

    /// Read an output file from the workspace
    async fn read_output(&self, handle: &Self::Handle, name: &str) -> Result<Vec<u8>, EngineError>;

    /// Release the workspace
    async fn cleanup(&self, handle: Self::Handle);

    /// Get engine name for logging
    fn name(&self) -> &str;
}
