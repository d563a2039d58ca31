pub mod runtime;

pub use runtime::locate_java_binary;
pub use runtime::required_runtime;
pub use runtime::LocalRuntime;
pub use runtime::ProvisionState;
pub use runtime::RuntimeProvisioner;
pub use runtime::RuntimeRequirement;
