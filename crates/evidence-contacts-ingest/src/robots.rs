// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! robots.txt checks.
//!
//! Fails open: an unreachable, non-200 or unparsable robots.txt allows
//! everything. Only an explicit disallow for our agent token or `*` blocks.

use crate::http_client::HttpClient;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use texting_robots::Robot;
use url::Url;

const ROBOTS_TIMEOUT_MS: u64 = 5_000;

/// Parsed rules for one origin.
pub struct RobotsRules {
    agent: Robot,
    wildcard: Robot,
}

impl RobotsRules {
    pub fn parse(body: &str, agent: &str) -> Option<Self> {
        let agent_rules = Robot::new(agent, body.as_bytes()).ok()?;
        let wildcard = Robot::new("*", body.as_bytes()).ok()?;
        Some(Self {
            agent: agent_rules,
            wildcard,
        })
    }

    pub fn allowed(&self, url: &str) -> bool {
        self.agent.allowed(url) && self.wildcard.allowed(url)
    }
}

/// `scheme://host[:port]/robots.txt` for a page URL.
pub fn robots_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let origin = match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    };
    Some(format!("{origin}/robots.txt"))
}

/// Per-origin robots cache. Lives as long as the fetcher that owns it.
pub struct RobotsCache {
    client: HttpClient,
    agent: String,
    rules: Mutex<HashMap<String, Option<Arc<RobotsRules>>>>,
}

impl RobotsCache {
    pub fn new(client: HttpClient, agent: impl Into<String>) -> Self {
        Self {
            client,
            agent: agent.into(),
            rules: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `url` may be fetched.
    pub async fn allowed(&self, url: &str) -> bool {
        let Some(robots) = robots_url(url) else {
            return true;
        };

        let cached = self
            .rules
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&robots)
            .cloned();
        let rules = match cached {
            Some(rules) => rules,
            None => {
                let fetched = self.fetch(&robots).await.map(Arc::new);
                self.rules
                    .lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .insert(robots.clone(), fetched.clone());
                fetched
            }
        };

        match rules {
            Some(rules) => {
                let allowed = rules.allowed(url);
                if !allowed {
                    tracing::info!("robots.txt disallows {url}");
                }
                allowed
            }
            None => true,
        }
    }

    async fn fetch(&self, robots: &str) -> Option<RobotsRules> {
        let resp = match self.client.get(robots, ROBOTS_TIMEOUT_MS).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("robots.txt unreachable at {robots}: {e:#}; allowing");
                return None;
            }
        };
        if resp.status != 200 {
            tracing::debug!("robots.txt at {robots} answered {}; allowing", resp.status);
            return None;
        }
        let rules = RobotsRules::parse(&resp.body, &self.agent);
        if rules.is_none() {
            tracing::warn!("robots.txt at {robots} did not parse; allowing");
        }
        rules
    }
}
