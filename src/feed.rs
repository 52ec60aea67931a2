//! Resolved feed configuration
//!
//! A [`FeedDefinition`](crate::loader::FeedDefinition) is a static document
//! full of `{{ params.* }}` templates. Resolution binds it to one run's
//! parameters, producing concrete auth, client, and endpoint configuration.
//! Resolution performs no network calls.

use std::collections::HashMap;
use std::time::Duration;

use crate::auth::{AuthConfig, Location};
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RequestConfig, ThrottleConfig};
use crate::loader::{AuthDefinition, FeedDefinition};
use crate::pagination::OffsetPagination;
use crate::params::RunContext;
use crate::template::{render, render_value, TemplateContext};
use crate::transform::{DictionarySource, TransformChain};
use crate::types::{FetchMode, JsonValue, Method, OptionStringExt, StringMap};
use crate::xml::XmlOptions;

/// The data endpoint after template resolution
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// HTTP method
    pub method: Method,
    /// URL, absolute or relative to the client base
    pub url: String,
    /// Request headers
    pub headers: StringMap,
    /// Query parameters shared by every page
    pub query: StringMap,
    /// JSON request body
    pub body: Option<JsonValue>,
    /// Urlencoded form body
    pub form: Option<StringMap>,
    /// How the response body is read
    pub fetch_mode: FetchMode,
    /// JSON path to the records array in each page
    pub records_path: String,
    /// Pagination fields
    pub pagination: OffsetPagination,
}

impl EndpointConfig {
    /// Build the request config for one page
    pub fn page_request(&self, page_params: &StringMap) -> RequestConfig {
        let mut config = RequestConfig::new().fetch_mode(self.fetch_mode);
        for (key, value) in &self.headers {
            config = config.header(key.clone(), value.clone());
        }
        for (key, value) in &self.query {
            config = config.query(key.clone(), value.clone());
        }
        for (key, value) in page_params {
            config = config.query(key.clone(), value.clone());
        }
        if let Some(body) = &self.body {
            config = config.json(body.clone());
        }
        if let Some(form) = &self.form {
            config = config.form(form.clone());
        }
        config
    }
}

/// A feed definition bound to one run's parameters
#[derive(Debug, Clone)]
pub struct ResolvedFeed {
    /// Feed name
    pub name: String,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// HTTP client configuration
    pub client: HttpClientConfig,
    /// The data endpoint
    pub endpoint: EndpointConfig,
    /// Field transformations
    pub transforms: TransformChain,
    /// Metadata endpoint for per-run field renames
    pub dictionary: Option<DictionarySource>,
    /// XML output shape
    pub xml: XmlOptions,
    /// Parameter or token echoed back as the next run's context
    pub run_context_param: Option<String>,
}

impl ResolvedFeed {
    /// Resolve a definition against a run context.
    ///
    /// Fails on any template referencing an undefined variable, so
    /// misconfigured feeds die before touching the network.
    pub fn resolve(def: &FeedDefinition, ctx: &RunContext) -> Result<Self> {
        let tctx = TemplateContext::from_run_context(ctx);

        let base_url = match &def.http.base_url {
            Some(raw) => {
                let rendered = render(raw, &tctx)?;
                url::Url::parse(&rendered)?;
                Some(rendered)
            }
            None => None,
        };

        // The login request goes through the raw client, so a relative
        // login_url must be joined against the base here
        let auth = match &def.auth {
            Some(auth_def) => resolve_auth(auth_def, &tctx, base_url.as_deref())?,
            None => AuthConfig::None,
        };

        let mut client = HttpClientConfig::builder()
            .timeout(Duration::from_secs(def.http.timeout_secs))
            .max_retries(def.http.max_retries)
            .retry(
                def.http.retry_style,
                Duration::from_millis(def.http.retry_interval_ms),
            );
        if let Some(base_url) = base_url {
            client = client.base_url(base_url);
        }
        if let Some(rps) = def.http.rate_limit_rps {
            client = client.throttle(ThrottleConfig::new(rps, rps));
        }
        for (key, value) in &def.http.headers {
            client = client.header(key.clone(), render(value, &tctx)?);
        }
        if let Some(agent) = &def.http.user_agent {
            client = client.user_agent(agent.clone());
        }

        let endpoint = EndpointConfig {
            method: def.request.method,
            url: render(&def.request.url, &tctx)?,
            headers: render_map(&def.request.headers, &tctx)?,
            query: render_map(&def.request.params, &tctx)?,
            body: def
                .request
                .body
                .as_ref()
                .map(|b| render_value(b, &tctx))
                .transpose()?,
            form: def
                .request
                .form
                .as_ref()
                .map(|f| render_map(f, &tctx))
                .transpose()?,
            fetch_mode: def.request.fetch_mode,
            records_path: def.records_path.clone(),
            pagination: OffsetPagination::new(
                def.pagination.offset_param.clone(),
                def.pagination.size_param.clone(),
                def.pagination.page_size,
                def.pagination.total_path.clone(),
            ),
        };

        let dictionary = match &def.field_dictionary {
            Some(source) => Some(DictionarySource {
                url: render(&source.url, &tctx)?,
                ..source.clone()
            }),
            None => None,
        };

        Ok(Self {
            name: def.name.clone(),
            auth,
            client: client.build(),
            endpoint,
            transforms: def.transforms.clone(),
            dictionary,
            xml: def.xml.clone(),
            run_context_param: def.run_context_param.clone(),
        })
    }
}

/// Resolve an auth definition's templates into runtime auth config
fn resolve_auth(
    def: &AuthDefinition,
    tctx: &TemplateContext,
    base_url: Option<&str>,
) -> Result<AuthConfig> {
    let config = match def {
        AuthDefinition::None => AuthConfig::None,
        AuthDefinition::Basic { username, password } => AuthConfig::Basic {
            username: render(username, tctx)?,
            password: render(password, tctx)?,
        },
        AuthDefinition::ApiKey {
            key,
            value,
            location,
            prefix,
        } => {
            let location = parse_location(location)?;
            AuthConfig::ApiKey {
                location,
                header_name: matches!(location, Location::Header).then(|| key.clone()),
                query_param: matches!(location, Location::Query).then(|| key.clone()),
                prefix: prefix.clone().none_if_empty(),
                value: render(value, tctx)?,
            }
        }
        AuthDefinition::Bearer { token } => AuthConfig::Bearer {
            token: render(token, tctx)?,
        },
        AuthDefinition::SessionToken {
            login_url,
            method,
            body,
            token_path,
            header_name,
            header_prefix,
        } => AuthConfig::Session {
            login_url: join_url(base_url, &render(login_url, tctx)?),
            login_method: (*method).into(),
            login_body: render_value(body, tctx)?,
            token_path: token_path.clone(),
            token_header: header_name.clone(),
            token_prefix: header_prefix.clone().none_if_empty(),
        },
    };
    Ok(config)
}

/// Join a possibly relative URL against the client base, mirroring how
/// data requests are addressed
fn join_url(base: Option<&str>, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    match base {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/')),
        None => url.to_string(),
    }
}

fn parse_location(location: &str) -> Result<Location> {
    match location {
        "header" => Ok(Location::Header),
        "query" => Ok(Location::Query),
        other => Err(Error::invalid_value(
            "auth.location",
            format!("expected 'header' or 'query', got '{other}'"),
        )),
    }
}

fn render_map(map: &HashMap<String, String>, tctx: &TemplateContext) -> Result<StringMap> {
    map.iter()
        .map(|(k, v)| Ok((k.clone(), render(v, tctx)?)))
        .collect()
}
