//! Test fixtures and constants.

/// Typical development env file.
pub const SAMPLE_ENV: &str = "DATABASE_URL=postgres://localhost/app\nAPI_KEY=sk-test-12345\n";

/// Production env file.
pub const SAMPLE_ENV_PROD: &str =
    "DATABASE_URL=postgres://db.internal/app\nAPI_KEY=sk-live-67890\n";

/// Ignore file hiding a nested secrets directory.
pub const GITIGNORE_SECRETS_DIR: &str = "secrets/\n";

/// A session token accepted by the in-process test server.
pub const TEST_TOKEN: &str = "test-token";

/// The user that [`TEST_TOKEN`] maps to.
pub const TEST_USER: &str = "user-1";
