//! Describe module: attribute type discovery through WFS `DescribeFeatureType`.
//!
//! A GET request is sent to the service, the XML schema in the response is
//! validated stage by stage, and the element declarations of the requested
//! feature type are converted into an [`AttrTypeMap`]. Every stage fails with
//! its own [`FilterError`] variant.

use crate::schema::{AttrTypeMap, AttrTypeMapBuilder};
use crate::types::convert_attr_type_xml;
use crate::FilterError;
use log::{debug, warn};
use roxmltree::{Document, Node};
use std::time::Duration;

pub const WFS_SERVICE: &str = "WFS";
pub const DEFAULT_WFS_VERSION: &str = "1.1.0";

/// Parameters of a `DescribeFeatureType` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeRequest {
    pub version: String,
    /// Only applied by [`WfsClient`]; discovery itself never times out.
    pub timeout: Option<Duration>,
}

impl Default for DescribeRequest {
    fn default() -> Self {
        Self {
            version: DEFAULT_WFS_VERSION.to_string(),
            timeout: None,
        }
    }
}

impl DescribeRequest {
    pub fn query_params(&self) -> [(&'static str, &str); 3] {
        [
            ("service", WFS_SERVICE),
            ("version", self.version.as_str()),
            ("request", "DescribeFeatureType"),
        ]
    }
}

/// What the transport hands back: a status and, if one arrived, the body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Option<String>,
}

/// The transport used for discovery requests.
pub trait HttpClient {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, FilterError>;
}

/// Blocking reqwest transport.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct WfsClient {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl WfsClient {
    pub fn new(request: &DescribeRequest) -> Result<Self, FilterError> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| FilterError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "http")]
impl HttpClient for WfsClient {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, FilterError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| FilterError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().ok();
        Ok(HttpResponse { status, body })
    }
}

/// Requests the schema of `typename` from the WFS at `url`.
pub fn fetch_attr_types<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
    typename: &str,
    request: &DescribeRequest,
) -> Result<AttrTypeMap, FilterError> {
    debug!("DescribeFeatureType {} for {}", url, typename);
    let response = client.get(url, &request.query_params())?;
    debug!("DescribeFeatureType {} answered with status {}", url, response.status);
    parse_describe_feature_type(response.body.as_deref(), typename)
}

/// Callback form of [`fetch_attr_types`]: exactly one of `onsuccess` and
/// `onerror` is called.
///
/// Without a client, a [`WfsClient`] with default settings is used when the
/// `http` feature is enabled.
pub fn describe_feature_type_wfs<S, E>(
    url: &str,
    typename: &str,
    onsuccess: S,
    onerror: E,
    client: Option<&dyn HttpClient>,
) where
    S: FnOnce(AttrTypeMap),
    E: FnOnce(FilterError),
{
    let result = match client {
        Some(client) => fetch_attr_types(client, url, typename, &DescribeRequest::default()),
        None => fetch_with_default_client(url, typename),
    };
    match result {
        Ok(attr_types) => onsuccess(attr_types),
        Err(err) => {
            warn!("DescribeFeatureType {} for {} failed: {}", url, typename, err);
            onerror(err)
        }
    }
}

#[cfg(feature = "http")]
fn fetch_with_default_client(url: &str, typename: &str) -> Result<AttrTypeMap, FilterError> {
    let request = DescribeRequest::default();
    let client = WfsClient::new(&request)?;
    fetch_attr_types(&client, url, typename, &request)
}

#[cfg(not(feature = "http"))]
fn fetch_with_default_client(_url: &str, _typename: &str) -> Result<AttrTypeMap, FilterError> {
    Err(FilterError::Transport("no http client available".to_string()))
}

/// Validates a `DescribeFeatureType` response body and extracts the attribute
/// types of `typename`.
pub fn parse_describe_feature_type(body: Option<&str>, typename: &str) -> Result<AttrTypeMap, FilterError> {
    let xml = body.filter(|b| !b.trim().is_empty()).ok_or(FilterError::InvalidResponse)?;
    let doc = Document::parse(xml).map_err(|e| match e {
        roxmltree::Error::NoRootNode => FilterError::EmptyResponse,
        e => {
            debug!("response is not XML: {}", e);
            FilterError::InvalidResponse
        }
    })?;
    let root = doc.root();
    // The schema must be the first node of the document; a leading comment or
    // processing instruction leaves no usable schema root.
    let schema = root.first_child().ok_or(FilterError::EmptyResponse)?;
    if !schema.is_element() {
        debug!("first node of the response is {:?}, not an element", schema.node_type());
        return Err(FilterError::InvalidSchema);
    }
    let children: Vec<Node> = schema.children().filter(Node::is_element).collect();
    if children.is_empty() {
        return Err(FilterError::EmptySchema);
    }
    if let Some(exception) = children.iter().find(|c| c.has_attribute("exceptionCode")) {
        return Err(FilterError::ServiceException(text_content(exception)));
    }
    let target = find_type_node(&children, typename)
        .ok_or_else(|| FilterError::UnknownTypename(typename.to_string()))?;
    Ok(collect_attr_types(target))
}

fn text_content(node: &Node) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

// The declaration named `typename`. A top-level element that only refers to a
// complexType by its `type` attribute is resolved to that complexType.
fn find_type_node<'a, 'i>(children: &[Node<'a, 'i>], typename: &str) -> Option<Node<'a, 'i>> {
    let local = local_name(typename);
    let named = |name: &str| {
        children
            .iter()
            .find(|c| c.attribute("name").is_some_and(|n| n == name))
            .copied()
    };
    let node = named(typename).or_else(|| named(local))?;
    if has_element_declarations(&node) {
        return Some(node);
    }
    let referenced = node
        .attribute("type")
        .map(|t| local_name(t).to_string())
        .unwrap_or_else(|| format!("{}Type", local));
    Some(named(referenced.as_str()).unwrap_or(node))
}

fn is_element_declaration(node: &Node) -> bool {
    node.is_element() && node.tag_name().name() == "element"
}

fn has_element_declarations(node: &Node) -> bool {
    node.descendants().skip(1).any(|n| is_element_declaration(&n))
}

fn collect_attr_types(target: Node) -> AttrTypeMap {
    let mut builder = AttrTypeMapBuilder::new();
    for element in target.descendants().skip(1).filter(is_element_declaration) {
        let Some(name) = element.attribute("name") else {
            continue;
        };
        // inline simple types carry their base type on a restriction
        let ty = element.attribute("type").or_else(|| {
            element
                .descendants()
                .find(|n| n.tag_name().name() == "restriction")
                .and_then(|r| r.attribute("base"))
        });
        if let Some(ty) = ty {
            builder.insert(name, convert_attr_type_xml(ty));
        }
    }
    builder.build()
}
