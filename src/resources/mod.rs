//! Resources mounted by the HTTP server.
//!
//! Every resource is a [`ResourceDescriptor`] built over one shared
//! [`ResourceStore`]; the server routes each path to the decision engine.
//!
//! | Path | Methods | Notes |
//! |------|---------|-------|
//! | `/entries` | GET, POST | list; create with a fresh id |
//! | `/entries/{id}` | GET, PUT, DELETE | 410 after delete |
//! | `/items/{id}` | GET | 301 to `/entries/{id}` |
//! | `/documents/{id}` | GET, PUT, PATCH | text, `old\|new` patches |
//! | `/clock` | GET | quantized `Last-Modified` |

pub mod clock;
pub mod document;
pub mod entries;

use std::sync::Arc;
use std::time::Duration;

use crate::config::ResourcesConfig;
use crate::resource::{DescriptorError, ResourceDescriptor};
use crate::store::ResourceStore;

/// A descriptor bound to a route path.
#[derive(Debug, Clone)]
pub struct Mount {
    pub path: &'static str,
    pub descriptor: Arc<ResourceDescriptor>,
}

impl Mount {
    fn new(path: &'static str, descriptor: ResourceDescriptor) -> Self {
        Self {
            path,
            descriptor: Arc::new(descriptor),
        }
    }
}

/// Build every resource against `store`.
pub fn mounts(store: &ResourceStore, config: &ResourcesConfig) -> Result<Vec<Mount>, DescriptorError> {
    Ok(vec![
        Mount::new("/entries", entries::collection(store, config.post_redirect)?),
        Mount::new("/entries/{id}", entries::item(store, config.allow_put_create)?),
        Mount::new("/items/{id}", entries::legacy_item(store)?),
        Mount::new("/documents/{id}", document::document(store)?),
        Mount::new(
            "/clock",
            clock::clock(Duration::from_secs(config.clock_granularity_secs))?,
        ),
    ])
}
