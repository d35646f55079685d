//! Transport and TLS option builders shared by VLESS and Trojan.

use crate::models::{GrpcOptions, H2Options, HttpOptions, RealityOptions, TransportOptions, WsOptions};
use crate::utils::params::QueryParams;

pub(super) fn reality_options(params: &QueryParams) -> RealityOptions {
    RealityOptions {
        public_key: params.get_or("pbk", ""),
        short_id: params.get_or("sid", ""),
    }
}

pub(super) fn ws_options(params: &QueryParams) -> WsOptions {
    WsOptions::new(params.get_or("path", "/"), params.get("host").unwrap_or(""))
}

pub(super) fn grpc_options(params: &QueryParams) -> GrpcOptions {
    GrpcOptions {
        grpc_service_name: params.get_or("serviceName", ""),
    }
}

fn split_path(params: &QueryParams) -> Vec<String> {
    params
        .get_or("path", "/")
        .split(',')
        .map(str::to_string)
        .collect()
}

/// Builds the transport block for `network`.
///
/// `ws` and `grpc` are always recognized; `h2` and `http` only when
/// `extended` is set. Other networks carry no options block.
pub(super) fn stream_transport(network: &str, params: &QueryParams, extended: bool) -> TransportOptions {
    let mut transport = TransportOptions::network(network);
    match network {
        "ws" => transport.ws_opts = Some(ws_options(params)),
        "grpc" => transport.grpc_opts = Some(grpc_options(params)),
        "h2" if extended => {
            transport.h2_opts = Some(H2Options {
                path: split_path(params),
                host: params.get_list("host"),
            })
        }
        "http" if extended => {
            let hosts = params
                .get("host")
                .map(|host| host.split(',').map(str::to_string).collect())
                .unwrap_or_default();
            transport.http_opts = Some(HttpOptions::new(split_path(params), hosts));
        }
        _ => {}
    }
    transport
}
