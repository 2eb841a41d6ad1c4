//! Static content for hosts without a route.
//!
//! Files under the configured root are served as-is; any other GET gets
//! the index document so client-side routing keeps working.

use std::path::PathBuf;

use tower_http::services::{ServeDir, ServeFile};

use crate::config::StaticFilesConfig;

pub fn static_fallback(config: &StaticFilesConfig) -> ServeDir<ServeFile> {
    let root = PathBuf::from(&config.root);
    let index = root.join(&config.index);
    ServeDir::new(root).fallback(ServeFile::new(index))
}
