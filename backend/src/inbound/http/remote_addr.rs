//! Client address resolution for audit records and request spans.
//!
//! Order: `X-Forwarded-For` (second-to-last hop when several are listed, the
//! sole entry otherwise), then `X-Real-IP`, then the TCP peer. Values that do
//! not parse as an IP address are skipped.

use std::net::IpAddr;

use actix_web::HttpRequest;

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|value| value.to_str().ok())
}

fn parse_ip(candidate: &str) -> Option<IpAddr> {
    candidate.trim().parse().ok()
}

fn forwarded_for(value: &str) -> Option<IpAddr> {
    let hops: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .collect();
    let chosen = match hops.as_slice() {
        [] => None,
        [only] => Some(*only),
        [.., second_to_last, _] => Some(*second_to_last),
    }?;
    parse_ip(chosen)
}

/// Resolve the client address of `req`.
pub fn remote_addr(req: &HttpRequest) -> Option<String> {
    header(req, FORWARDED_FOR)
        .and_then(forwarded_for)
        .or_else(|| header(req, REAL_IP).and_then(parse_ip))
        .or_else(|| req.peer_addr().map(|addr| addr.ip()))
        .map(|ip| ip.to_string())
}
