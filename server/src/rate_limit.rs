use std::{
    env,
    net::{IpAddr, Ipv4Addr},
    time::{Duration, Instant},
};

use dashmap::DashMap;
use rocket::{
    http::Status,
    request::{self, FromRequest, Request},
};
use tracing::{debug, instrument, warn};

/// Per-client allowance of session creations; refills completely once per period.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: u32,
    tokens: u32,
    period: Duration,
    refilled_at: Instant,
}

impl TokenBucket {
    fn full(capacity: u32, period: Duration) -> Self {
        Self {
            capacity,
            tokens: capacity,
            period,
            refilled_at: Instant::now(),
        }
    }

    fn try_consume(&mut self) -> bool {
        self.refill();
        match self.tokens.checked_sub(1) {
            Some(left) => {
                self.tokens = left;
                true
            }
            None => false,
        }
    }

    fn refill(&mut self) {
        if self.refilled_at.elapsed() < self.period {
            return;
        }
        if self.tokens < self.capacity {
            debug!("Token bucket refilled: {} -> {}", self.tokens, self.capacity);
        }
        self.tokens = self.capacity;
        self.refilled_at = Instant::now();
    }
}

pub type RateLimiter = DashMap<IpAddr, TokenBucket>;

pub fn create_rate_limiter() -> RateLimiter {
    DashMap::new()
}

/// Address a request is attributed to: proxy headers first, then the peer address.
#[derive(Debug)]
pub struct ClientIp(pub IpAddr);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ClientIp {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let ip = req
            .headers()
            .get_one("X-Forwarded-For")
            .and_then(|header| header.split(',').next())
            .and_then(|ip| ip.trim().parse().ok())
            .or_else(|| {
                req.headers()
                    .get_one("X-Real-IP")
                    .and_then(|ip| ip.trim().parse().ok())
            })
            .or_else(|| req.client_ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

        request::Outcome::Success(ClientIp(ip))
    }
}

#[instrument(level = "trace", skip(rate_limiter))]
pub fn check_rate_limit(rate_limiter: &RateLimiter, ip: &IpAddr) -> Result<(), Status> {
    let capacity: u32 = env::var("RATE_LIMIT_GAMES_PER_MINUTE")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(10);

    let mut bucket = rate_limiter
        .entry(*ip)
        .or_insert_with(|| TokenBucket::full(capacity, Duration::from_secs(60)));

    if bucket.try_consume() {
        debug!("Rate limit check passed for {}", ip);
        Ok(())
    } else {
        warn!("Rate limit exceeded for {} - rejecting request", ip);
        Err(Status::TooManyRequests)
    }
}
