//! Test fixtures - reusable project documents.

/// Contract with a selector, two defaulted variables, a dev-only flag and one secret
pub const CONTRACT: &str = r#"
variables:
  APP_ENV:
    type: string
    required: true
  LOG_LEVEL:
    type: enum
    values: [debug, info, warn]
    default: info
  PORT:
    type: int
    default: 8080
  DEBUG_TOOLBAR:
    type: bool
    default: true
    scopes: [dev]
  DB_PASSWORD:
    type: string
    required: true
    secret: true
    secret_ref: db_password
"#;

pub const MOCK_SECRETS: &str = "db_password:\n  backend: mock\n";

/// A value that must never show up outside the delivered artifact
pub const SECRET_VALUE: &str = "s3cr3t-Hunter2-value";

pub const ENVFILE_POLICY: &str = r#"
version: 1
targets:
  defaults:
    provider: envfile
    runtime: compose
    transport:
      kind: local
      dir: deploy
"#;
