//! Build-time tooling for the Hyperk firmware
//!
//! Three stages run for every build target: [`version`] resolves the project version,
//! [`embed`] turns the web UI assets into a generated C header, and [`package`] copies the
//! linked program into the release directory and assembles factory images.

pub mod defines;
pub mod embed;
pub mod env;
mod error;
pub mod package;
pub mod version;

pub use defines::Defines;
pub use env::BuildEnv;
pub use error::Error;
pub use version::Version;
