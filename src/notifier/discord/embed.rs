// notifier/discord/embed.rs

use crate::model::{Listing, Severity};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const NEW_LISTING_COLOR: u32 = 0xFFD700;
pub const FOOTER_TEXT: &str = "OLX Sniper";
pub const BOT_NAME: &str = "OLX Sniper";

#[derive(Debug, Serialize)]
pub struct WebhookPayload {
    pub username: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub color: u32,
    pub timestamp: String,
    pub footer: Footer,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
}

#[derive(Debug, Serialize)]
pub struct Footer {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

pub fn severity_color(severity: Severity) -> u32 {
    match severity {
        Severity::Success => 0x2ECC71,
        Severity::Info => 0x3498DB,
        Severity::Warning => 0xF39C12,
        Severity::Error => 0xE74C3C,
    }
}

fn severity_title(severity: Severity) -> &'static str {
    match severity {
        Severity::Success => "✅ OLX Sniper",
        Severity::Info => "ℹ️ OLX Sniper",
        Severity::Warning => "⚠️ OLX Sniper",
        Severity::Error => "❌ OLX Sniper",
    }
}

fn footer(now: DateTime<Utc>) -> Footer {
    Footer {
        text: format!("{} • {}", FOOTER_TEXT, now.format("%Y-%m-%d %H:%M:%S UTC")),
    }
}

pub fn listing_payload(listing: &Listing, now: DateTime<Utc>) -> WebhookPayload {
    let embed = Embed {
        title: format!("🔔 New listing: {}", listing.title),
        description: format!("**{}**\n{}", listing.price, listing.url),
        url: Some(listing.url.clone()),
        color: NEW_LISTING_COLOR,
        timestamp: now.to_rfc3339(),
        footer: footer(now),
        fields: vec![
            Field {
                name: "💰 Price".into(),
                value: listing.price.clone(),
                inline: true,
            },
            Field {
                name: "🔗 Link".into(),
                value: format!("[Open listing]({})", listing.url),
                inline: true,
            },
        ],
    };
    WebhookPayload {
        username: BOT_NAME.into(),
        embeds: vec![embed],
    }
}

pub fn status_payload(message: &str, severity: Severity, now: DateTime<Utc>) -> WebhookPayload {
    let embed = Embed {
        title: severity_title(severity).into(),
        description: message.into(),
        url: None,
        color: severity_color(severity),
        timestamp: now.to_rfc3339(),
        footer: footer(now),
        fields: Vec::new(),
    };
    WebhookPayload {
        username: BOT_NAME.into(),
        embeds: vec![embed],
    }
}
