//! Transport Executor
//!
//! Materializes desired state at a provider:
//!
//! - `mockcloud` - the deployed record is the provider state
//! - `envfile` - a rendered env file delivered locally or over ssh
//!
//! Health checks, remote hash verification and mock secret rotation live
//! here as well.

mod envfile;
mod healthcheck;
mod hosts;
mod local;
mod mockcloud;
mod ssh;

pub use envfile::{render_env_file, EnvFilePayload};
pub use healthcheck::{wait_healthy, HealthcheckTiming};
pub use hosts::{parse_hosts_file, resolve_targets};
pub use local::{deliver_local, local_hash, local_path};
pub use mockcloud::{generate_secret, rotate_mock_secret, ROTATED_SECRET_LEN};
pub use ssh::{deliver_ssh, meta_path, remote_hashes, remote_path};
