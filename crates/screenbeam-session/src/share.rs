//! Viewer links: building the one a sender hands out and reading the
//! target identity back out of it.

use std::fmt;

use screenbeam_common::{ConfigError, PeerId};
use screenbeam_config::schema::ShareConfig;
use url::Url;

/// URL a viewer opens to watch a given sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    url: Url,
    target: PeerId,
}

impl ShareLink {
    /// `{base_url}/{viewer_page}?{query_param}={id}`
    pub fn build(config: &ShareConfig, id: &PeerId) -> Result<Self, ConfigError> {
        let base = config.base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/{}", config.viewer_page)).map_err(|e| {
            ConfigError::ValidationError(format!("share.base_url {:?}: {e}", config.base_url))
        })?;
        url.query_pairs_mut()
            .clear()
            .append_pair(&config.query_param, id.as_str());
        Ok(Self {
            url,
            target: id.clone(),
        })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn target(&self) -> &PeerId {
        &self.target
    }
}

impl fmt::Display for ShareLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Extract the sender identity a viewer should connect to.
///
/// `input` may be a full viewer URL, a query string (`?view=...`) or bare
/// `key=value` pairs. A missing or empty parameter is
/// `ConfigError::MissingTarget`.
pub fn parse_target(input: &str, param: &str) -> Result<PeerId, ConfigError> {
    let input = input.trim();
    let found = match Url::parse(input) {
        Ok(url) => url
            .query_pairs()
            .find(|(k, _)| k == param)
            .map(|(_, v)| v.into_owned()),
        Err(_) => {
            let query = input.rsplit_once('?').map_or(input, |(_, q)| q);
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(k, _)| k == param)
                .map(|(_, v)| v.into_owned())
        }
    };

    match found {
        Some(id) if !id.trim().is_empty() => Ok(PeerId::new(id.trim())),
        _ => Err(ConfigError::MissingTarget {
            param: param.to_string(),
        }),
    }
}
