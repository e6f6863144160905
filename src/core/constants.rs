//! Constants used throughout sentra.
//!
//! Centralizes magic strings and configuration values.

/// State directory relative to HOME (~/.sentra).
pub const STATE_DIR: &str = ".sentra";

/// Environment variable overriding the state directory.
pub const STATE_DIR_ENV: &str = "SENTRA_HOME";

/// Client configuration file inside the state directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Staging index file.
pub const INDEX_FILE: &str = "index.json";

/// Directory holding one JSON file per commit.
pub const COMMITS_DIR: &str = "commits";

/// Commit IDs the server has acknowledged.
pub const PUSHED_FILE: &str = "pushed.json";

/// Per-installation symmetric key.
pub const INSTALLATION_KEY_FILE: &str = "installation.key";

/// Device signing key seed.
pub const DEVICE_KEY_FILE: &str = "device.key";

/// Device public key, shared at pairing time.
pub const DEVICE_PUBKEY_FILE: &str = "device.pub";

/// Device machine identifier.
pub const MACHINE_ID_FILE: &str = "machine_id";

/// Session files written by older releases.
pub const LEGACY_SESSION_FILES: &[&str] = &["session.json", "session.key"];

/// Secret file marker. A file is collected when its name starts with this.
pub const ENV_FILE_PREFIX: &str = ".env";

/// Per-directory ignore file.
pub const IGNORE_FILE: &str = ".gitignore";

/// Version-control marker that makes a directory a project root.
pub const PROJECT_MARKER: &str = ".git";

/// Directory names never walked, regardless of ignore files.
pub const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".next",
    ".turbo",
    "build",
    "dist",
    "node_modules",
    "vendor",
];

/// Default scan root relative to HOME (~/dev).
pub const DEFAULT_SCAN_DIR: &str = "dev";

/// Default timeout for outbound network calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default sync server port when no URL is configured.
pub const DEFAULT_SERVER_PORT: &str = "8080";

/// Cipher identifier attached to every encrypted file.
pub const CIPHER_NAME: &str = "ed25519+aes-256-gcm-v1";

/// Push payload version.
pub const PUSH_VERSION: u32 = 1;

/// Signed-request headers.
pub const HEADER_MACHINE_ID: &str = "X-Sentra-Machine-ID";
pub const HEADER_TIMESTAMP: &str = "X-Sentra-Timestamp";
pub const HEADER_SIGNATURE: &str = "X-Sentra-Signature";
