//! The fixed catalog of exposed lookup operations.
//!
//! Every lookup runs the same pipeline: classify the address, resolve the
//! endpoint, dispatch, normalize. Tools differ only in which [`Operation`]
//! they route as and which extra query parameters they send.

use crate::address::classify;
use crate::config::Config;
use crate::dispatch::{HttpTransport, LookupRequest, RequestDispatcher};
use crate::error::LookupError;
use crate::normalize::{self, Lookup};
use crate::router::{self, Operation, Routing};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// What a tool does when called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// Provider lookup for a caller-supplied `ip`.
    Lookup(Operation),
    /// Resolve the caller's own address, then run a location lookup.
    UserNetworkIp,
}

/// A tool exposed to the hosting protocol layer.
#[derive(Debug)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ToolKind,
}

impl ToolSpec {
    /// Whether the tool takes the `ip` argument.
    pub fn takes_ip(&self) -> bool {
        matches!(self.kind, ToolKind::Lookup(_))
    }

    /// JSON schema of the tool arguments.
    pub fn input_schema(&self) -> Value {
        if self.takes_ip() {
            json!({
                "type": "object",
                "properties": {
                    "ip": {
                        "type": "string",
                        "description": "IP地址 支持IPv4与IPv6",
                    }
                },
                "required": ["ip"],
            })
        } else {
            json!({
                "type": "object",
                "properties": {},
            })
        }
    }
}

pub static TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "aiwen_ip_location",
        description: "IP定位 根据IP地址获取IP位置(城市级/区县级/街道级)、使用者、运营商、经纬度等信息",
        kind: ToolKind::Lookup(Operation::Location),
    },
    ToolSpec {
        name: "aiwen_ip_scene",
        description: "IP应用场景 根据IP地址获取IP的应用场景，如家庭宽带、数据中心、移动网络、企业专线等",
        kind: ToolKind::Lookup(Operation::Scene),
    },
    ToolSpec {
        name: "aiwen_ip_whois",
        description: "IP WHOIS 根据IP地址获取所属网段的WHOIS注册信息，如网段范围、注册机构、注册国家等",
        kind: ToolKind::Lookup(Operation::IpWhois),
    },
    ToolSpec {
        name: "aiwen_as_whois",
        description: "AS WHOIS 根据IP地址获取其所属自治系统(AS)的WHOIS信息",
        kind: ToolKind::Lookup(Operation::AsWhois),
    },
    ToolSpec {
        name: "aiwen_ip_host",
        description: "IP宿主信息 根据IP地址获取宿主信息，如AS号、所属机构、运营商等",
        kind: ToolKind::Lookup(Operation::Host),
    },
    ToolSpec {
        name: "aiwen_ip_risk_portrait",
        description: "IP风险画像 根据IP地址获取风险评分及风险标签，如代理、VPN、秒拨、数据中心等",
        kind: ToolKind::Lookup(Operation::RiskPortrait),
    },
    ToolSpec {
        name: "aiwen_ip_identity_check",
        description: "IP真人概率 根据IP地址判断该IP背后为真实用户的可能性",
        kind: ToolKind::Lookup(Operation::IdentityCheck),
    },
    ToolSpec {
        name: "aiwen_ip_industry",
        description: "IP行业分类 根据IP地址获取IP使用者所属的行业类别",
        kind: ToolKind::Lookup(Operation::Industry),
    },
    ToolSpec {
        name: "user_network_ip",
        description: "获取当前网络IP地址 根据当前网络IP地址获取位置信息",
        kind: ToolKind::UserNetworkIp,
    },
];

/// Extra query parameters an operation sends besides `ip`.
pub fn extra_params(operation: Operation) -> &'static [(&'static str, &'static str)] {
    match operation {
        Operation::Location => &[("coordsys", "WGS84")],
        Operation::Scene => &[("lang", "cn")],
        _ => &[],
    }
}

/// Look up a tool by name.
pub fn find_tool(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|tool| tool.name == name)
}

/// Runs catalog operations against the provider.
pub struct Catalog {
    config: Arc<Config>,
    dispatcher: RequestDispatcher,
}

impl Catalog {
    /// Create a catalog. Fails if the endpoint table has a hole.
    pub fn new(config: Arc<Config>, transport: Arc<dyn HttpTransport>) -> Result<Self, LookupError> {
        router::verify_table()?;

        info!(
            tools = TOOLS.len(),
            ipv4_accuracy = %config.accuracy.ipv4,
            ipv6_accuracy = %config.accuracy.ipv6,
            "Operation catalog ready"
        );

        let dispatcher = RequestDispatcher::new(config.clone(), transport);
        Ok(Self { config, dispatcher })
    }

    /// All exposed tools.
    pub fn tools(&self) -> &'static [ToolSpec] {
        TOOLS
    }

    /// Invoke a tool by name with JSON arguments.
    pub async fn call(&self, name: &str, arguments: &Value) -> Result<Lookup, LookupError> {
        let tool = find_tool(name)
            .ok_or_else(|| LookupError::Input(format!("unknown tool: {}", name)))?;

        match tool.kind {
            ToolKind::Lookup(operation) => {
                let ip = ip_argument(arguments)?;
                self.lookup(operation, ip).await
            }
            ToolKind::UserNetworkIp => self.user_network_ip().await,
        }
    }

    /// Build the provider request for an operation.
    pub fn prepare(&self, operation: Operation, ip: &str) -> Result<LookupRequest, LookupError> {
        let family = classify(ip);
        let tier = match operation.routing() {
            Routing::Tiered => Some(self.config.tier_for(family)),
            Routing::PerFamily | Routing::Shared => None,
        };
        let path = router::resolve(operation, family, tier)?;

        Ok(LookupRequest::new(
            operation,
            ip,
            family,
            path,
            extra_params(operation),
        ))
    }

    /// Run one lookup end to end.
    pub async fn lookup(&self, operation: Operation, ip: &str) -> Result<Lookup, LookupError> {
        let ip = ip.trim();
        if ip.is_empty() {
            return Err(LookupError::Input("ip must not be empty".to_string()));
        }

        let request = self.prepare(operation, ip)?;
        let raw = self.dispatcher.dispatch(&request).await?;
        let lookup = normalize::normalize(&raw)?;

        debug!(
            operation = %operation,
            ip = %ip,
            degraded = lookup.is_degraded(),
            "Lookup complete"
        );

        Ok(lookup)
    }

    /// Locate the caller's own network address.
    pub async fn user_network_ip(&self) -> Result<Lookup, LookupError> {
        let raw = self.dispatcher.fetch(&self.config.upstream.self_ip_url).await?;
        let ip = normalize::self_ip(&raw)?;
        debug!(ip = %ip, "Resolved current network IP");
        self.lookup(Operation::Location, &ip).await
    }
}

fn ip_argument(arguments: &Value) -> Result<&str, LookupError> {
    match arguments.get("ip") {
        Some(Value::String(ip)) if !ip.trim().is_empty() => Ok(ip.as_str()),
        Some(Value::String(_)) => Err(LookupError::Input("ip must not be empty".to_string())),
        Some(_) => Err(LookupError::Input("ip must be a string".to_string())),
        None => Err(LookupError::Input("missing required argument: ip".to_string())),
    }
}
