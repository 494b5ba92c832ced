//! Mention polling and reply dispatch.
//!
//! One sequential loop: fetch mentions, turn each new one into replies,
//! post them, advance the watermark, sleep. Rate limits on fetch are waited
//! out without advancing the watermark; any other fetch failure ends the run.
//! Resolution and posting failures only ever cost the single reply involved.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use backon::{BackoffBuilder, ConstantBuilder};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::common::error::{ResolveError, ResolveResult, SourceError, SourceResult};
use crate::common::{same_handle, Mention, ReplyMessage};
use crate::registry::{CharityResolver, Resolution};

use super::extractor::Extractor;
use super::formatter::{ReplyFormatter, RequestKind};
use super::source::MentionSource;
use super::watermark::Watermark;

/// Source of "now" for watermark updates.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Loop timing and behaviour.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Handle the bot answers to; its own mentions are ignored.
    pub handle: String,
    pub poll_interval: Duration,
    /// Wait before retrying a rate-limited fetch.
    pub rate_limit_cooldown: Duration,
    /// Upper bound on each external call.
    pub call_timeout: Duration,
    /// Log replies instead of posting them.
    pub debug: bool,
}

/// What happened to one reply.
#[derive(Debug)]
pub enum DispatchOutcome {
    Posted,
    /// Debug mode: printed, not posted.
    Suppressed,
    Failed(SourceError),
}

/// Counters for one polling cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub skipped: usize,
    pub posted: usize,
    pub suppressed: usize,
    pub failed: usize,
    /// Failed posts that were refused for rate limiting.
    pub rate_limited: usize,
}

impl CycleReport {
    fn record(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Posted => self.posted += 1,
            DispatchOutcome::Suppressed => self.suppressed += 1,
            DispatchOutcome::Failed(e) => {
                self.failed += 1;
                if e.is_rate_limited() {
                    self.rate_limited += 1;
                }
            }
        }
    }
}

/// Drives the mention pipeline.
pub struct Dispatcher<S, R> {
    source: S,
    resolver: R,
    extractor: Extractor,
    formatter: ReplyFormatter,
    settings: DispatchSettings,
    clock: Clock,
}

impl<S: MentionSource, R: CharityResolver> Dispatcher<S, R> {
    pub fn new(
        source: S,
        resolver: R,
        formatter: ReplyFormatter,
        settings: DispatchSettings,
    ) -> Result<Self, fancy_regex::Error> {
        Ok(Self {
            extractor: Extractor::new(&settings.handle)?,
            source,
            resolver,
            formatter,
            settings,
            clock: Arc::new(Utc::now),
        })
    }

    /// Replace the wall clock used to advance the watermark.
    #[cfg(test)]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Poll forever. Returns only when a fetch fails for a reason other than
    /// rate limiting.
    pub async fn run(&self, mut watermark: Watermark) -> SourceResult<()> {
        info!(
            "Checking for new mentions every {} seconds",
            self.settings.poll_interval.as_secs()
        );

        loop {
            let (next, report) = self.poll_once(watermark).await.map_err(|e| {
                error!(
                    watermark = %watermark.timestamp(),
                    "Fetching mentions failed: {}", e
                );
                e
            })?;
            watermark = next;

            info!(
                fetched = report.fetched,
                skipped = report.skipped,
                posted = report.posted,
                suppressed = report.suppressed,
                failed = report.failed,
                rate_limited = report.rate_limited,
                "Cycle complete, last checked {}",
                watermark.timestamp().format("%Y-%m-%d %H:%M:%S")
            );

            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    /// Run one fetch-process-dispatch cycle and return the advanced watermark.
    pub async fn poll_once(&self, watermark: Watermark) -> SourceResult<(Watermark, CycleReport)> {
        let mentions = self.fetch_with_cooldown().await?;
        let mut report = CycleReport {
            fetched: mentions.len(),
            ..CycleReport::default()
        };

        for mention in &mentions {
            if watermark.already_processed(mention.created_at) {
                debug!(mention_id = %mention.id, "Skipping mention from before watermark");
                report.skipped += 1;
                continue;
            }
            if same_handle(&mention.author, &self.settings.handle) {
                debug!(mention_id = %mention.id, "Skipping our own mention");
                report.skipped += 1;
                continue;
            }

            info!(
                mention_id = %mention.id,
                author = %mention.author,
                created_at = %mention.created_at,
                "<Mention> {}", mention.text
            );

            let replies = self.replies_for(mention).await;
            for reply in &replies {
                let outcome = self.dispatch(reply).await;
                report.record(&outcome);
            }
        }

        Ok((watermark.advance((self.clock)()), report))
    }

    /// Fetch mentions, waiting out rate limits for as long as they last.
    async fn fetch_with_cooldown(&self) -> SourceResult<Vec<Mention>> {
        let cooldown = self.settings.rate_limit_cooldown;
        let mut cooldowns = ConstantBuilder::default()
            .with_delay(cooldown)
            .without_max_times()
            .build();

        loop {
            let timeout = self.settings.call_timeout;
            let result = with_timeout(timeout, self.source.fetch_mentions(), || {
                SourceError::Timeout(timeout)
            })
            .await;

            match result {
                Err(e) if e.is_rate_limited() => {
                    let delay = cooldowns.next().unwrap_or(cooldown);
                    warn!(
                        "Rate limited while fetching mentions, retrying in {:.0} seconds",
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    /// Every reply a mention should get, in the order they are sent.
    ///
    /// One reply per registration number that resolves, then one for the
    /// search command if there is one.
    pub async fn replies_for(&self, mention: &Mention) -> Vec<ReplyMessage> {
        let extraction = self.extractor.extract(&mention.text);
        if extraction.is_empty() {
            debug!(mention_id = %mention.id, "Nothing to look up");
            return Vec::new();
        }
        let mut replies = Vec::new();

        for number in &extraction.registration_numbers {
            let Some(resolution) = self.resolve(mention, RequestKind::Number, number).await else {
                continue;
            };
            let record = resolution.into_record();
            if record.is_none() {
                debug!(mention_id = %mention.id, registration_number = %number, "No charity found");
            }
            if let Some(text) =
                self.formatter
                    .format_reply(record.as_ref(), &mention.author, RequestKind::Number)
            {
                replies.push(self.reply(mention, text));
            }
        }

        if let Some(ref query) = extraction.search_query {
            let request = RequestKind::Search(query);
            if let Some(resolution) = self.resolve(mention, request, query).await {
                let record = resolution.into_record();
                if let Some(text) = self
                    .formatter
                    .format_reply(record.as_ref(), &mention.author, request)
                {
                    replies.push(self.reply(mention, text));
                }
            }
        }

        replies
    }

    /// Look one value up, logging and swallowing network failures.
    async fn resolve(
        &self,
        mention: &Mention,
        request: RequestKind<'_>,
        value: &str,
    ) -> Option<Resolution> {
        let timeout = self.settings.call_timeout;
        let result: ResolveResult<Resolution> = match request {
            RequestKind::Number => {
                with_timeout(timeout, self.resolver.resolve_by_number(value), || {
                    ResolveError::Timeout(timeout)
                })
                .await
            }
            RequestKind::Search(_) => {
                with_timeout(timeout, self.resolver.resolve_by_search(value), || {
                    ResolveError::Timeout(timeout)
                })
                .await
            }
        };

        match result {
            Ok(resolution) => Some(resolution),
            Err(e) => {
                let stage = match request {
                    RequestKind::Number => "resolve_number",
                    RequestKind::Search(_) => "resolve_search",
                };
                warn!(
                    mention_id = %mention.id,
                    user = %mention.author,
                    stage,
                    backend = self.resolver.name(),
                    value,
                    "Lookup failed, skipping: {}", e
                );
                None
            }
        }
    }

    fn reply(&self, mention: &Mention, text: String) -> ReplyMessage {
        ReplyMessage {
            in_reply_to: mention.id.clone(),
            recipient: mention.author.clone(),
            text,
        }
    }

    /// Post one reply. Failures are logged and reported, never raised.
    pub async fn dispatch(&self, reply: &ReplyMessage) -> DispatchOutcome {
        if self.settings.debug {
            info!(mention_id = %reply.in_reply_to, "<Reply to {}> {}", reply.in_reply_to, reply.text);
            return DispatchOutcome::Suppressed;
        }

        let timeout = self.settings.call_timeout;
        let result = with_timeout(
            timeout,
            self.source.post_reply(&reply.text, &reply.in_reply_to),
            || SourceError::Timeout(timeout),
        )
        .await;

        match result {
            Ok(()) => {
                info!(mention_id = %reply.in_reply_to, "<Reply to {}> {}", reply.in_reply_to, reply.text);
                DispatchOutcome::Posted
            }
            Err(e) => {
                warn!(
                    mention_id = %reply.in_reply_to,
                    user = %reply.recipient,
                    stage = "post_reply",
                    rate_limited = e.is_rate_limited(),
                    "<FAILED Reply to {}> {}: {}", reply.in_reply_to, reply.text, e
                );
                DispatchOutcome::Failed(e)
            }
        }
    }
}

/// Bound an external call, mapping expiry to the caller's timeout error.
async fn with_timeout<T, E, F>(
    limit: Duration,
    call: F,
    on_timeout: impl FnOnce() -> E,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout()),
    }
}
