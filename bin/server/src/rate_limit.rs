//! Per-IP request throttling.
//!
//! A token bucket per client address, applied as a tower layer. Read and
//! write routes carry separate limiters so a burst of list requests cannot
//! starve mutations (or the other way around).
//!
//! Proxy headers (`X-Forwarded-For`, `X-Real-IP`) are only honored when
//! `VERIGEEK_TRUST_PROXY` is set, so a directly exposed server cannot be
//! tricked into throttling a spoofed address. A request whose client
//! address cannot be determined at all is denied rather than waved through.

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    response::IntoResponse,
};
use std::collections::HashMap;
use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tower::{Layer, Service};
use tracing::{debug, warn};

/// Throttle parameters for one route group.
#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Sustained refill rate, in requests per second.
    pub refill_per_sec: f64,
    /// Burst capacity of a fresh bucket.
    pub burst: u32,
    /// Buckets idle for longer than this are dropped.
    pub idle_eviction: Duration,
}

impl ThrottleConfig {
    /// Limits for the read routes (listing, fetching, health).
    pub fn for_reads() -> Self {
        Self {
            refill_per_sec: 100.0,
            burst: 200,
            idle_eviction: Duration::from_secs(300),
        }
    }

    /// Tighter limits for the write routes (auth, mutations).
    pub fn for_writes() -> Self {
        Self {
            refill_per_sec: 20.0,
            burst: 40,
            idle_eviction: Duration::from_secs(300),
        }
    }

    /// Seconds a denied client should wait before retrying.
    fn retry_after_secs(&self) -> u64 {
        (1.0 / self.refill_per_sec).ceil().max(1.0) as u64
    }
}

/// Token bucket for one client address.
#[derive(Debug)]
struct ClientBucket {
    tokens: f64,
    touched: Instant,
}

impl ClientBucket {
    fn full(config: &ThrottleConfig) -> Self {
        Self {
            tokens: config.burst as f64,
            touched: Instant::now(),
        }
    }

    /// Refills for the elapsed time, then takes one token if available.
    fn admit(&mut self, config: &ThrottleConfig) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.touched).as_secs_f64();

        self.tokens = (self.tokens + elapsed * config.refill_per_sec).min(config.burst as f64);
        self.touched = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Bucket table shared by all clones of the service.
#[derive(Debug)]
struct ThrottleTable {
    buckets: HashMap<IpAddr, ClientBucket>,
    config: ThrottleConfig,
    last_eviction: Instant,
}

impl ThrottleTable {
    fn new(config: ThrottleConfig) -> Self {
        Self {
            buckets: HashMap::new(),
            config,
            last_eviction: Instant::now(),
        }
    }

    fn admit(&mut self, addr: IpAddr) -> bool {
        if self.last_eviction.elapsed() > self.config.idle_eviction {
            self.evict_idle();
        }

        let config = self.config;
        self.buckets
            .entry(addr)
            .or_insert_with(|| ClientBucket::full(&config))
            .admit(&config)
    }

    fn evict_idle(&mut self) {
        let cutoff = self.config.idle_eviction;
        let before = self.buckets.len();
        self.buckets.retain(|_, b| b.touched.elapsed() <= cutoff);
        if self.buckets.len() < before {
            debug!("Evicted {} idle throttle buckets", before - self.buckets.len());
        }
        self.last_eviction = Instant::now();
    }
}

/// Tower layer installing per-IP throttling on a route group.
#[derive(Clone)]
pub struct ThrottleLayer {
    table: Arc<Mutex<ThrottleTable>>,
    config: ThrottleConfig,
}

impl ThrottleLayer {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            table: Arc::new(Mutex::new(ThrottleTable::new(config))),
            config,
        }
    }
}

impl<S> Layer<S> for ThrottleLayer {
    type Service = ThrottleService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ThrottleService {
            inner,
            table: self.table.clone(),
            config: self.config,
        }
    }
}

/// Service wrapper that checks the bucket before forwarding.
#[derive(Clone)]
pub struct ThrottleService<S> {
    inner: S,
    table: Arc<Mutex<ThrottleTable>>,
    config: ThrottleConfig,
}

impl<S> Service<Request<Body>> for ThrottleService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let admitted = match client_addr(&req) {
            Some(addr) => {
                let mut table = self.table.lock().unwrap_or_else(|poisoned| {
                    warn!("Throttle table was poisoned, recovering");
                    poisoned.into_inner()
                });
                let ok = table.admit(addr);
                if !ok {
                    warn!("Throttling requests from {}", addr);
                }
                ok
            }
            // No resolvable client address means no bucket to charge, so
            // the request is denied outright.
            None => {
                warn!("Denying request with no resolvable client address");
                false
            }
        };

        if !admitted {
            let retry_after = self.config.retry_after_secs().to_string();
            let response = (
                StatusCode::TOO_MANY_REQUESTS,
                [("Retry-After", retry_after)],
                "Too many requests",
            )
                .into_response();
            return Box::pin(async move { Ok(response) });
        }

        let future = self.inner.call(req);
        Box::pin(future)
    }
}

/// Resolves the client address, preferring proxy headers only when
/// `VERIGEEK_TRUST_PROXY` is enabled.
fn client_addr<B>(req: &Request<B>) -> Option<IpAddr> {
    let trust_proxy = std::env::var("VERIGEEK_TRUST_PROXY")
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false);

    if trust_proxy {
        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());
        if forwarded.is_some() {
            return forwarded;
        }

        let real_ip = req
            .headers()
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());
        if real_ip.is_some() {
            return real_ip;
        }
    }

    req.extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip())
}
