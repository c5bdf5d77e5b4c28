//! Client-side resource mapper for the WMS JSON service.
//!
//! # Overview
//! A resource type (see [`resource!`]) binds to one endpoint segment under a
//! base URL. Fetching issues a blocking `GET {base_url}/{type}/{path}?{query}`,
//! validates the service envelope and maps each `data.result_list` entry to a
//! [`ResourceRecord`].
//!
//! # Design
//! - Failures never surface as `Err`: they are appended to the resource
//!   type's [`ErrorLog`] and the call returns no records. Check the log after
//!   every fetch.
//! - Per-type state lives in a [`ResourceState`] held by a [`Registry`];
//!   [`ResourceFetcher`] takes it explicitly, [`WmsClient`] wires both up.
//! - The HTTP round-trip goes through the [`Transport`] trait, with
//!   [`UreqTransport`] as the default.
//!
//! ```no_run
//! use wms_resource::{GlobalConfig, Listing, Query, WmsClient};
//!
//! let mut client = WmsClient::new(GlobalConfig::new("http://wms.local"));
//! let query = Query::new().param("city", "lisbon");
//! let listings = client.get::<Listing>("search", Some(&query));
//! if !client.errors::<Listing>().is_empty() {
//!     eprintln!("{}", client.errors::<Listing>());
//! }
//! for listing in &listings {
//!     println!("{:?}", listing.get_str("title"));
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod query;
pub mod record;
pub mod resource;
pub mod state;

pub use client::{parse_response, ParsedResponse, ResourceFetcher, WmsClient};
pub use config::GlobalConfig;
pub use error::{ConfigError, ErrorLog, TransportError, WmsError};
pub use http::{HttpRequest, HttpResponse, Transport, UreqTransport};
pub use query::{build_query, Query};
pub use record::ResourceRecord;
pub use resource::{Branding, Listing, Resource};
pub use state::{LastResponse, Registry, ResourceState};
