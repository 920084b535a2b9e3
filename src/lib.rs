//! Aiwen IP intelligence lookups as MCP tools.
//!
//! Wraps the Aiwen (ipplus360) REST API and exposes its lookups to MCP
//! hosts over stdio or HTTP.
//!
//! # Features
//!
//! - **IP Location** - City, district or street accuracy, chosen per address family
//! - **Scene / WHOIS / Host** - Usage scene, IP and AS WHOIS, hosting information
//! - **Risk & Identity** - Risk portrait, real-person probability, industry classification
//! - **Current Network IP** - Locate the machine the server runs on
//!
//! # Example Configuration
//!
//! ```yaml
//! api_key: "${AIWEN_API_KEY}"
//!
//! accuracy:
//!   ipv4: district
//!   ipv6: city
//! ```
//!
//! Without a config file the same settings come from `AIWEN_API_KEY`,
//! `AIWEN_IPV4_ACCURACY` and `AIWEN_IPV6_ACCURACY`.

pub mod address;
pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod normalize;
pub mod router;
pub mod server;

pub use catalog::Catalog;
pub use config::Config;
pub use error::LookupError;
pub use server::McpServer;
