use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use axum::{
    Router,
    http::{HeaderName, HeaderValue},
};
use clap::Parser;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};

pub const CROSS_ORIGIN_OPENER_POLICY: &str = "cross-origin-opener-policy";
pub const CROSS_ORIGIN_EMBEDDER_POLICY: &str = "cross-origin-embedder-policy";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Serves the converter page with cross-origin isolation headers", long_about = None)]
pub struct ServerConfig {
    /// Sets the IP address to bind the server to
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED), env = "VIDSHIFT_HOST")]
    pub host: IpAddr,

    /// Sets the Port to bind the server to
    #[arg(long, default_value_t = 3000, env = "VIDSHIFT_PORT")]
    pub port: u16,

    /// Directory whose files are served
    #[arg(long, default_value = ".", env = "VIDSHIFT_ROOT")]
    pub root: PathBuf,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Static file router. Every response, errors included, carries the two
/// headers browsers require before they expose `SharedArrayBuffer`.
pub fn create_router(root: PathBuf) -> Router {
    let assets = ServeDir::new(root).append_index_html_on_directories(true);

    Router::new()
        .fallback_service(assets)
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(CROSS_ORIGIN_OPENER_POLICY),
            HeaderValue::from_static("same-origin"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(CROSS_ORIGIN_EMBEDDER_POLICY),
            HeaderValue::from_static("require-corp"),
        ))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["static-server"]).expect("defaults parse");
        assert_eq!(config.port, 3000);
        assert_eq!(config.root, PathBuf::from("."));
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::try_parse_from([
            "static-server",
            "--host",
            "127.0.0.1",
            "--port",
            "8080",
            "--root",
            "public",
        ])
        .expect("overrides parse");
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.root, PathBuf::from("public"));
    }
}
