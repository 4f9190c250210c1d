//! Rendering of surviving records into webhook payloads

use std::collections::HashMap;

use serde::Serialize;

use crate::config::{Config, FormatConfig, FormatStrategy, WebhookConfig};
use crate::model::{NodeCategory, RecordKind, StatusRecord};

/// Appended to the detail URL prefix and node id
pub const DETAIL_URI_SUFFIX: &str = "/detail";

/// Marker ending any text cut at the size limit
pub const ELLIPSIS: &str = "...";

const EMBED_TITLE_LIMIT: usize = 256;
const EMBED_DESCRIPTION_LIMIT: usize = 4096;
const EMBED_TOTAL_LIMIT: usize = 6000;

/// Characters with meaning in the destination's markdown dialect
const MARKDOWN_SPECIAL: &[char] = &['\\', '*', '_', '~', '`', '|', '>', '#', '[', ']'];

/// JSON body of one webhook message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookPayload {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    pub allowed_mentions: AllowedMentions,
}

impl WebhookPayload {
    /// Number of records carried by this payload
    pub fn record_count(&self) -> usize {
        match &self.content {
            Some(content) => content.lines().count(),
            None => self.embeds.len(),
        }
    }
}

/// One rich entry of a message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub author: EmbedAuthor,
    pub title: String,
    pub url: String,
    pub description: String,
    pub color: u32,
    pub footer: EmbedFooter,
}

impl Embed {
    fn char_count(&self) -> usize {
        self.author.name.chars().count()
            + self.title.chars().count()
            + self.description.chars().count()
            + self.footer.text.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// Mention parsing switched off so record text can never ping anyone
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AllowedMentions {
    pub parse: Vec<String>,
}

/// Builds webhook payloads for a (category, kind) pair
#[derive(Debug, Clone)]
pub struct AlertFormatter {
    webhook: WebhookConfig,
    format: FormatConfig,
    detail_url_bases: HashMap<NodeCategory, String>,
}

impl AlertFormatter {
    pub fn new(config: &Config) -> Self {
        let detail_url_bases = NodeCategory::ALL
            .into_iter()
            .map(|c| (c, config.category(c).detail_url_base.clone()))
            .collect();
        Self {
            webhook: config.webhook.clone(),
            format: config.format.clone(),
            detail_url_bases,
        }
    }

    pub fn strategy(&self) -> FormatStrategy {
        self.format.strategy
    }

    /// Render `records` into one or more payloads; empty input yields no payloads
    pub fn format(
        &self,
        records: &[StatusRecord],
        category: NodeCategory,
        kind: RecordKind,
    ) -> Vec<WebhookPayload> {
        if records.is_empty() {
            return Vec::new();
        }
        let payloads = match self.format.strategy {
            FormatStrategy::Embeds => self.format_embeds(records, category, kind),
            FormatStrategy::Text => self.format_text(records),
        };
        tracing::debug!(
            "Formatted {} {} {} record(s) into {} payload(s)",
            records.len(),
            category,
            kind,
            payloads.len()
        );
        payloads
    }

    /// Link to a node's page on the category's status site
    pub fn detail_url(&self, category: NodeCategory, record: &StatusRecord) -> String {
        let base = self
            .detail_url_bases
            .get(&category)
            .map(String::as_str)
            .unwrap_or_default();
        format!("{}{}{}", base, record.detail_identifier, DETAIL_URI_SUFFIX)
    }

    fn format_embeds(
        &self,
        records: &[StatusRecord],
        category: NodeCategory,
        kind: RecordKind,
    ) -> Vec<WebhookPayload> {
        let footer = format!("{} node {}", category, kind);
        let mut payloads = Vec::new();
        let mut current: Vec<Embed> = Vec::new();
        let mut current_chars = 0;

        for record in records {
            let url = self.detail_url(category, record);
            let embed = Embed {
                author: EmbedAuthor {
                    name: truncate_with_marker(&record.host_name, EMBED_TITLE_LIMIT),
                    url: url.clone(),
                    icon_url: self.webhook.icon_url.clone(),
                },
                title: escape_truncated(&record.host_name, EMBED_TITLE_LIMIT),
                url,
                description: escape_truncated(&describe(record), EMBED_DESCRIPTION_LIMIT),
                color: self.webhook.color,
                footer: EmbedFooter {
                    text: footer.clone(),
                },
            };
            let embed_chars = embed.char_count();

            let full = current.len() >= self.format.max_embeds_per_message
                || current_chars + embed_chars > EMBED_TOTAL_LIMIT;
            if full && !current.is_empty() {
                payloads.push(self.payload(None, std::mem::take(&mut current)));
                current_chars = 0;
            }
            current_chars += embed_chars;
            current.push(embed);
        }
        if !current.is_empty() {
            payloads.push(self.payload(None, current));
        }
        payloads
    }

    fn format_text(&self, records: &[StatusRecord]) -> Vec<WebhookPayload> {
        let limit = self.format.max_message_chars;
        let mut payloads = Vec::new();
        let mut current = String::new();
        let mut current_chars = 0;

        for record in records {
            let line = escape_truncated(&describe(record), limit);
            let line_chars = line.chars().count();

            if !current.is_empty() && current_chars + 1 + line_chars > limit {
                payloads.push(self.payload(Some(std::mem::take(&mut current)), Vec::new()));
                current_chars = 0;
            }
            if !current.is_empty() {
                current.push('\n');
                current_chars += 1;
            }
            current.push_str(&line);
            current_chars += line_chars;
        }
        if !current.is_empty() {
            payloads.push(self.payload(Some(current), Vec::new()));
        }
        payloads
    }

    fn payload(&self, content: Option<String>, embeds: Vec<Embed>) -> WebhookPayload {
        WebhookPayload {
            username: self.webhook.username.clone(),
            avatar_url: self.webhook.avatar_url.clone(),
            content,
            embeds,
            allowed_mentions: AllowedMentions::default(),
        }
    }
}

/// One-line human description of a record
pub fn describe(record: &StatusRecord) -> String {
    format!(
        "{} has been down for {} mins due to failure of {}",
        record.host_name,
        record.display_minutes(),
        record.reason_code
    )
}

/// Backslash-escape markdown characters, defuse `@` mentions and flatten control characters
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        push_escaped(&mut escaped, c);
    }
    escaped
}

fn push_escaped(out: &mut String, c: char) {
    if MARKDOWN_SPECIAL.contains(&c) {
        out.push('\\');
        out.push(c);
    } else if c == '@' {
        out.push('@');
        out.push('\u{200B}');
    } else if c.is_control() {
        // keeps one record per line in text messages
        out.push(' ');
    } else {
        out.push(c);
    }
}

/// Escape `text` and cut it to exactly `limit` characters ending in [`ELLIPSIS`].
///
/// The cut falls between escaped characters, never inside one. A pair that
/// does not fit in the last free slot leaves a space before the marker.
pub fn escape_truncated(text: &str, limit: usize) -> String {
    let escaped = escape_markdown(text);
    if escaped.chars().count() <= limit {
        return escaped;
    }
    let marker_chars = ELLIPSIS.chars().count();
    if limit <= marker_chars {
        return ELLIPSIS.chars().take(limit).collect();
    }

    let budget = limit - marker_chars;
    let mut cut = String::new();
    let mut used = 0;
    let mut unit = String::with_capacity(4);
    for c in text.chars() {
        unit.clear();
        push_escaped(&mut unit, c);
        let unit_chars = unit.chars().count();
        if used + unit_chars > budget {
            break;
        }
        cut.push_str(&unit);
        used += unit_chars;
    }
    cut.extend(std::iter::repeat_n(' ', budget - used));
    cut.push_str(ELLIPSIS);
    cut
}

/// Cut `text` to exactly `limit` characters ending in [`ELLIPSIS`] when it is longer
pub fn truncate_with_marker(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let marker_chars = ELLIPSIS.chars().count();
    if limit <= marker_chars {
        return ELLIPSIS.chars().take(limit).collect();
    }
    let mut cut: String = text.chars().take(limit - marker_chars).collect();
    cut.push_str(ELLIPSIS);
    cut
}
