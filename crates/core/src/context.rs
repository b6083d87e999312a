//! Rule-key extraction from bid request context.
//!
//! Each schema dimension maps to one value derived from the request or the
//! impression. Anything that cannot be derived becomes the wildcard.

use std::sync::LazyLock;

use regex::Regex;

use crate::openrtb::{BidRequest, Imp, VIDEO_PLACEMENT_INSTREAM};
use crate::rules::{Schema, WILDCARD};

/// Supported schema dimension names.
pub mod dimension {
    pub const SITE_DOMAIN: &str = "siteDomain";
    pub const PUB_DOMAIN: &str = "pubDomain";
    pub const DOMAIN: &str = "domain";
    pub const BUNDLE: &str = "bundle";
    pub const CHANNEL: &str = "channel";
    pub const MEDIA_TYPE: &str = "mediaType";
    pub const SIZE: &str = "size";
    pub const GPT_SLOT: &str = "gptSlot";
    pub const AD_UNIT_CODE: &str = "adUnitCode";
    pub const COUNTRY: &str = "country";
    pub const DEVICE_TYPE: &str = "deviceType";

    pub const ALL: [&str; 11] = [
        SITE_DOMAIN,
        PUB_DOMAIN,
        DOMAIN,
        BUNDLE,
        CHANNEL,
        MEDIA_TYPE,
        SIZE,
        GPT_SLOT,
        AD_UNIT_CODE,
        COUNTRY,
        DEVICE_TYPE,
    ];
}

pub const MEDIA_BANNER: &str = "banner";
pub const MEDIA_VIDEO: &str = "video";
pub const MEDIA_VIDEO_OUTSTREAM: &str = "video-outstream";
pub const MEDIA_AUDIO: &str = "audio";
pub const MEDIA_NATIVE: &str = "native";

pub const DEVICE_PHONE: &str = "phone";
pub const DEVICE_TABLET: &str = "tablet";
pub const DEVICE_DESKTOP: &str = "desktop";

/// Deprecated channel name and the canonical name it maps to.
const CHANNEL_ALIAS: (&str, &str) = ("pbjs", "web");

/// Ad server whose slot name is used for the `gptSlot` dimension.
const GAM_AD_SERVER: &str = "gam";

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("(?i)phone|iphone|android.*mobile|mobile.*android").expect("valid regex")
});

static TABLET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("(?i)tablet|ipad|touch.*windows nt|windows nt.*touch|android").expect("valid regex")
});

fn or_wildcard(value: &str) -> String {
    if value.is_empty() {
        WILDCARD.to_string()
    } else {
        value.to_string()
    }
}

/// Build the desired rule-key parts for one impression, in schema order.
pub fn create_rule_key(schema: &Schema, request: &BidRequest, imp: &Imp) -> Vec<String> {
    schema
        .fields
        .iter()
        .map(|field| match field.as_str() {
            dimension::MEDIA_TYPE => media_type(imp),
            dimension::SIZE => size(imp),
            dimension::DOMAIN => domain(request),
            dimension::SITE_DOMAIN => site_domain(request),
            dimension::PUB_DOMAIN => publisher_domain(request),
            dimension::BUNDLE => bundle(request),
            dimension::COUNTRY => country(request),
            dimension::DEVICE_TYPE => device_type(request),
            dimension::CHANNEL => channel(request),
            dimension::GPT_SLOT => gpt_slot(imp),
            dimension::AD_UNIT_CODE => ad_unit_code(imp),
            _ => WILDCARD.to_string(),
        })
        .collect()
}

/// Media type of the impression; wildcard unless exactly one format.
pub fn media_type(imp: &Imp) -> String {
    let mut formats = Vec::with_capacity(1);
    if imp.banner.is_some() {
        formats.push(MEDIA_BANNER);
    }
    if let Some(video) = &imp.video {
        if video.placement == Some(VIDEO_PLACEMENT_INSTREAM) {
            formats.push(MEDIA_VIDEO);
        } else {
            formats.push(MEDIA_VIDEO_OUTSTREAM);
        }
    }
    if imp.audio.is_some() {
        formats.push(MEDIA_AUDIO);
    }
    if imp.native.is_some() {
        formats.push(MEDIA_NATIVE);
    }

    match formats.as_slice() {
        [single] => single.to_string(),
        _ => WILDCARD.to_string(),
    }
}

/// `WxH` of the single banner format (or banner `w`/`h`), else of the video.
pub fn size(imp: &Imp) -> String {
    let (w, h) = if let Some(banner) = &imp.banner {
        match banner.format.as_slice() {
            [single] => (single.w, single.h),
            _ => (banner.w.unwrap_or(0), banner.h.unwrap_or(0)),
        }
    } else if let Some(video) = &imp.video {
        (video.w.unwrap_or(0), video.h.unwrap_or(0))
    } else {
        (0, 0)
    };

    if w != 0 && h != 0 {
        format!("{w}x{h}")
    } else {
        WILDCARD.to_string()
    }
}

/// Site (or app) domain, falling back to its publisher's domain.
pub fn domain(request: &BidRequest) -> String {
    if let Some(site) = &request.site {
        if !site.domain.is_empty() {
            return site.domain.clone();
        }
        if let Some(publisher) = &site.publisher {
            return or_wildcard(&publisher.domain);
        }
    } else if let Some(app) = &request.app {
        if !app.domain.is_empty() {
            return app.domain.clone();
        }
        if let Some(publisher) = &app.publisher {
            return or_wildcard(&publisher.domain);
        }
    }
    WILDCARD.to_string()
}

pub fn site_domain(request: &BidRequest) -> String {
    match (&request.site, &request.app) {
        (Some(site), _) => or_wildcard(&site.domain),
        (None, Some(app)) => or_wildcard(&app.domain),
        (None, None) => WILDCARD.to_string(),
    }
}

pub fn publisher_domain(request: &BidRequest) -> String {
    let publisher = match (&request.site, &request.app) {
        (Some(site), _) => site.publisher.as_ref(),
        (None, Some(app)) => app.publisher.as_ref(),
        (None, None) => None,
    };
    publisher
        .map(|p| or_wildcard(&p.domain))
        .unwrap_or_else(|| WILDCARD.to_string())
}

pub fn bundle(request: &BidRequest) -> String {
    request
        .app
        .as_ref()
        .map(|app| or_wildcard(&app.bundle))
        .unwrap_or_else(|| WILDCARD.to_string())
}

pub fn country(request: &BidRequest) -> String {
    request
        .device
        .as_ref()
        .and_then(|d| d.geo.as_ref())
        .map(|geo| or_wildcard(&geo.country))
        .unwrap_or_else(|| WILDCARD.to_string())
}

/// Classify the user agent as phone, tablet or desktop.
pub fn device_type(request: &BidRequest) -> String {
    let ua = match &request.device {
        Some(device) if !device.ua.is_empty() => device.ua.as_str(),
        _ => return WILDCARD.to_string(),
    };

    if PHONE_RE.is_match(ua) {
        DEVICE_PHONE.to_string()
    } else if TABLET_RE.is_match(ua) {
        DEVICE_TABLET.to_string()
    } else {
        DEVICE_DESKTOP.to_string()
    }
}

pub fn channel(request: &BidRequest) -> String {
    match request.channel_name() {
        Some(name) if name == CHANNEL_ALIAS.0 => CHANNEL_ALIAS.1.to_string(),
        Some(name) => or_wildcard(name),
        None => WILDCARD.to_string(),
    }
}

/// Ad-server slot for GAM inventory, else the Prebid ad slot.
pub fn gpt_slot(imp: &Imp) -> String {
    let Some(data) = imp.ext.as_ref().and_then(|e| e.data.as_ref()) else {
        return WILDCARD.to_string();
    };
    match &data.ad_server {
        Some(ad_server) if ad_server.name == GAM_AD_SERVER => or_wildcard(&ad_server.ad_slot),
        _ => or_wildcard(&data.pb_ad_slot),
    }
}

/// GPID, tag ID, Prebid ad slot, then stored-request ID.
pub fn ad_unit_code(imp: &Imp) -> String {
    let ext = imp.ext.as_ref();

    let candidates = [
        ext.map(|e| e.gpid.as_str()),
        Some(imp.tag_id.as_str()),
        ext.and_then(|e| e.data.as_ref()).map(|d| d.pb_ad_slot.as_str()),
        ext.and_then(|e| e.prebid.as_ref())
            .and_then(|p| p.stored_request.as_ref())
            .map(|s| s.id.as_str()),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| WILDCARD.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
