pub mod cache;
pub mod codec;
pub mod config;
pub mod index;
pub mod library;
pub mod metrics;
pub mod models;
pub mod plex;
pub mod testing;
pub mod wrap;

pub use cache::TtlCache;
pub use codec::{decode, encode, CodecError, PlexUri, UriKind, UrlResolver};
pub use config::{
    load_config, load_config_from_str, validate_config, CacheConfig, Config, ConfigError,
    IndexConfig, PlexConfig, PlexConnection, SanitizedConfig, ServerConfig,
};
pub use index::{CatalogIndex, CatalogNode, IndexError, IndexStats, NodeItem, NodeKind};
pub use library::PlexLibrary;
pub use models::{Album, Artist, Image, Ref, RefKind, SearchQuery, SearchResult, Track};
pub use plex::{connect, PlexError, PlexHttpClient, PlexServer};
pub use wrap::{SearchHit, WrapError};
