//! Domain Entities
//!
//! Core business objects: the contract, secret references, cloud targets,
//! and the desired/deployed state pair that reconciliation compares.

mod contract;
mod deployed_state;
mod desired_state;
mod secret_config;
mod target;

pub use contract::{
    is_valid_name, Contract, ContractDocument, ContractVariable, MigrationDocument,
    VariableDocument,
};
pub use deployed_state::{DeployedState, EnvFileRecord, SecretMetadata, RECORD_VERSION};
pub use desired_state::{DesiredState, SecretRef};
pub use secret_config::{
    parse_secret_refs, validate_secret_name, BackendKind, BwsScope, SecretBackendConfig,
    SecretRefDocument, SecretRefsDocument,
};
pub use target::{
    CloudTarget, ComposeMetadata, Healthcheck, HealthcheckDocument, Hooks, LocalTransport,
    SshHost, SshHostEntry, SshTransport, TargetDocument, Transport, TransportDocument,
    DEFAULT_ENV_FILE_TEMPLATE, DEFAULT_FILE_MODE,
};
