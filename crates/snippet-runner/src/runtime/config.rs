use std::{collections::HashMap, path::PathBuf, time::Duration};

use reqwest::header::HeaderMap;
use schemars::JsonSchema;
use secrecy::SecretString;
use serde::Deserialize;
use snippet_runner::{client::Client, errors::RunnerError};
use url::Url;

use super::logging::Logging;

const URL_ENV: &str = "ATL_URL";
const USERNAME_ENV: &str = "ATL_USERNAME";
const PASSWORD_ENV: &str = "ATL_PASSWORD";
const SNIPPET_PATH_ENV: &str = "ATL_SNIPPET_PATH";

/// Configuration for the snippet runner
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// The GraphQL endpoint snippets run against
    pub url: Option<Url>,

    /// Username for HTTP basic auth
    pub username: Option<String>,

    /// Password or API token for HTTP basic auth
    #[schemars(with = "Option<String>")]
    pub password: Option<SecretString>,

    /// Directory containing one subdirectory per snippet
    pub snippet_path: Option<PathBuf>,

    /// List of hard-coded headers to include in all GraphQL requests
    #[serde(deserialize_with = "parsers::map_from_str")]
    #[schemars(schema_with = "header_map")]
    pub headers: HeaderMap,

    /// Timeout for each request to the GraphQL endpoint
    #[serde(with = "humantime_serde")]
    #[schemars(with = "String")]
    pub timeout: Duration,

    /// Introspection configuration
    pub introspection: Introspection,

    /// Logging configuration
    pub logging: Logging,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            snippet_path: None,
            headers: HeaderMap::new(),
            timeout: defaults::timeout(),
            introspection: Introspection::default(),
            logging: Logging::default(),
        }
    }
}

/// Introspection configuration
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Introspection {
    /// The number of types which may be introspected at the same time
    /// (1 fetches them strictly one after another)
    pub max_concurrent_fetches: usize,
}

impl Default for Introspection {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 1,
        }
    }
}

impl Config {
    /// The directory to look for snippets in
    pub fn snippet_path(&self) -> Result<PathBuf, RunnerError> {
        self.snippet_path
            .clone()
            .ok_or_else(|| RunnerError::EnvironmentVariable(SNIPPET_PATH_ENV.to_string()))
    }

    /// Build a client for the configured endpoint, with `extra_headers` taking priority
    pub fn client(&self, extra_headers: HeaderMap) -> Result<Client, RunnerError> {
        let url = self
            .url
            .clone()
            .ok_or_else(|| RunnerError::EnvironmentVariable(URL_ENV.to_string()))?;
        let username = self
            .username
            .clone()
            .ok_or_else(|| RunnerError::EnvironmentVariable(USERNAME_ENV.to_string()))?;
        let password = self
            .password
            .clone()
            .ok_or_else(|| RunnerError::EnvironmentVariable(PASSWORD_ENV.to_string()))?;

        let mut headers = self.headers.clone();
        headers.extend(extra_headers);

        Client::new(url, username, password, headers, self.timeout)
    }
}

fn header_map(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
    // A header map is just a hash map of string to string with extra validation
    HashMap::<String, String>::json_schema(generator)
}

mod defaults {
    use std::time::Duration;

    pub(super) const fn timeout() -> Duration {
        Duration::from_secs(30)
    }
}

mod parsers {
    use std::str::FromStr;

    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
    use serde::Deserializer;

    pub(super) fn map_from_str<'de, D>(deserializer: D) -> Result<HeaderMap, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MapFromStrVisitor;
        impl<'de> serde::de::Visitor<'de> for MapFromStrVisitor {
            type Value = HeaderMap;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a map of header string keys and values")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut parsed = HeaderMap::with_capacity(map.size_hint().unwrap_or(0));

                while let Some((key, value)) = map.next_entry::<String, String>()? {
                    let key = HeaderName::from_str(&key)
                        .map_err(|e| serde::de::Error::custom(e.to_string()))?;
                    let value = HeaderValue::from_str(&value)
                        .map_err(|e| serde::de::Error::custom(e.to_string()))?;

                    parsed.insert(key, value);
                }

                Ok(parsed)
            }
        }

        deserializer.deserialize_map(MapFromStrVisitor)
    }
}
