use std::{
    collections::{HashMap, VecDeque},
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;
use serde_json::json;
use tracing::warn;

use crate::state::AppState;

// Every this many requests, sources whose whole window has passed are
// dropped from the map.
const SWEEP_INTERVAL: usize = 1024;

/// Sliding-window request limiter keyed by source address.
///
/// Timestamps per source are pruned and counted under a single lock, so
/// concurrent requests sharing a window cannot race past the cap. Sources
/// that went quiet for a full window are swept out periodically so the map
/// stays bounded by the set of recently active clients.
pub struct RateLimiter {
    window: Duration,
    max: usize,
    hits: Mutex<HitLog>,
}

struct HitLog {
    sources: HashMap<IpAddr, VecDeque<Instant>>,
    ops_since_sweep: usize,
}

impl RateLimiter {
    pub fn new(window: Duration, max: usize) -> Self {
        Self {
            window,
            max,
            hits: Mutex::new(HitLog {
                sources: HashMap::new(),
                ops_since_sweep: 0,
            }),
        }
    }

    pub fn try_acquire(&self, source: IpAddr) -> bool {
        self.try_acquire_at(source, Instant::now())
    }

    fn try_acquire_at(&self, source: IpAddr, now: Instant) -> bool {
        let mut hits = self.hits.lock();

        hits.ops_since_sweep += 1;
        if hits.ops_since_sweep >= SWEEP_INTERVAL {
            let window = self.window;
            hits.sources
                .retain(|_, timestamps| newest_is_live(timestamps, window, now));
            hits.ops_since_sweep = 0;
        }

        let timestamps = hits.sources.entry(source).or_default();

        while timestamps
            .front()
            .is_some_and(|&t| now.duration_since(t) >= self.window)
        {
            timestamps.pop_front();
        }

        if timestamps.len() >= self.max {
            return false;
        }

        timestamps.push_back(now);
        true
    }

    #[cfg(test)]
    fn source_count(&self) -> usize {
        self.hits.lock().sources.len()
    }
}

fn newest_is_live(timestamps: &VecDeque<Instant>, window: Duration, now: Instant) -> bool {
    timestamps
        .back()
        .is_some_and(|&t| now.duration_since(t) < window)
}

pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let source = client_ip(&state, request.headers(), peer_addr(&request));

    if !state.limiter.try_acquire(source) {
        warn!("Rate limit exceeded for {source}");

        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "Too many requests, please try again later." })),
        )
            .into_response();
    }

    next.run(request).await
}

fn peer_addr(request: &Request) -> Option<SocketAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// The source address for rate limiting. Behind a trusted reverse-proxy hop
/// the peer address is the proxy itself, so the client is the last entry of
/// X-Forwarded-For.
fn client_ip(state: &AppState, headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
    if state.config.trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.rsplit(',').next())
            .and_then(|ip| ip.trim().parse::<IpAddr>().ok());

        if let Some(ip) = forwarded {
            return ip;
        }
    }

    peer.map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: IpAddr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7));
    const OTHER: IpAddr = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 1));

    #[test]
    fn cap_is_inclusive() {
        let limiter = RateLimiter::new(Duration::from_secs(900), 100);
        let now = Instant::now();

        for _ in 0..100 {
            assert!(limiter.try_acquire_at(SOURCE, now));
        }
        assert!(!limiter.try_acquire_at(SOURCE, now));
    }

    #[test]
    fn sources_are_independent() {
        let limiter = RateLimiter::new(Duration::from_secs(900), 1);
        let now = Instant::now();

        assert!(limiter.try_acquire_at(SOURCE, now));
        assert!(!limiter.try_acquire_at(SOURCE, now));
        assert!(limiter.try_acquire_at(OTHER, now));
    }

    #[test]
    fn quiet_sources_are_swept_out() {
        let limiter = RateLimiter::new(Duration::from_secs(900), 100);
        let start = Instant::now();

        for i in 0..2 * SWEEP_INTERVAL as u32 {
            let ip = IpAddr::V4(Ipv4Addr::from(0x0a00_0000 + i));
            assert!(limiter.try_acquire_at(ip, start));
        }

        // enough traffic after every window expired to force a sweep
        let later = start + Duration::from_secs(901);
        for _ in 0..SWEEP_INTERVAL {
            limiter.try_acquire_at(SOURCE, later);
        }

        assert_eq!(limiter.source_count(), 1);
    }

    #[test]
    fn window_slides() {
        let limiter = RateLimiter::new(Duration::from_secs(900), 2);
        let start = Instant::now();

        assert!(limiter.try_acquire_at(SOURCE, start));
        assert!(limiter.try_acquire_at(SOURCE, start + Duration::from_secs(600)));
        assert!(!limiter.try_acquire_at(SOURCE, start + Duration::from_secs(800)));

        // first hit has aged out, the second has not
        assert!(limiter.try_acquire_at(SOURCE, start + Duration::from_secs(900)));
        assert!(!limiter.try_acquire_at(SOURCE, start + Duration::from_secs(1000)));
    }
}
