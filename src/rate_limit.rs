use crate::AppState;
use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use crate::llm::RATE_LIMITED_REPLY;

/// Simple token bucket rate limiter.
///
/// One global bucket guarding the routes that cost money or send email
/// (chat submissions and the contact relay).
#[derive(Debug)]
pub struct SimpleRateLimiter {
    bucket: Mutex<Bucket>,
    rate_per_sec: f32,
    burst_size: f32,
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    last_update: Instant,
    tokens: f32,
}

impl SimpleRateLimiter {
    pub fn new(rate_per_sec: f32, burst_size: f32) -> Self {
        Self {
            bucket: Mutex::new(Bucket {
                last_update: Instant::now(),
                tokens: burst_size,
            }),
            rate_per_sec,
            burst_size,
        }
    }

    pub fn check(&self) -> bool {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_update).as_secs_f32();

        // The refill is recorded even when denying.
        bucket.tokens = (bucket.tokens + elapsed * self.rate_per_sec).min(self.burst_size);
        bucket.last_update = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Middleware to enforce rate limits
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if state.config.resilience.rate_limit_enabled && !state.rate_limiter.check() {
        tracing::warn!(name: "http.rate_limited", path = %req.uri().path(), "Request rate limited");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({ "error": RATE_LIMITED_REPLY })),
        )
            .into_response();
    }
    next.run(req).await
}
