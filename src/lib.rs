//! Sentra - discover, version, and sync `.env` files across repositories.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! ├── client            # Sync server HTTP client
//! ├── server/           # Sync server
//! │   ├── middleware    # Device signature verification
//! │   ├── auth          # Session tokens
//! │   ├── handlers      # Routes
//! │   └── repo/         # Storage backends (disabled, rpc, memory)
//! └── core/             # Core library components
//!     ├── ignore        # .gitignore rule stacks
//!     ├── scanner       # Project and .env discovery
//!     ├── store/        # Staging index and commit history
//!     ├── workspace     # scan → stage → commit workflow
//!     ├── cipher/       # Installation key and AES-256-GCM envelope
//!     ├── identity      # Device keypair
//!     ├── signing       # Request signatures
//!     ├── push          # Push request construction
//!     ├── cleanup       # Legacy file removal
//!     └── config        # config.toml and environment
//! ```
//!
//! Secret contents are encrypted on the client before they leave the
//! machine. The server stores opaque blobs and checks that every push is
//! signed by a registered device.

pub mod cli;
pub mod client;
pub mod core;
pub mod error;
pub mod server;
