//! Opening greeting, personalised by the hand-off context.
//!
//! Each known context shape has its own template with three closing tiers.
//! The output is Markdown and goes through the same renderer as any other
//! assistant message.

use std::ops::RangeInclusive;

use nuru_shared::{AuditContext, HandoffContext, ReadinessContext, RoiContext};
use rand::Rng;

/// Range of the "similar businesses analyzed" figure in the ROI greeting.
/// Flavour text only; it is not derived from any data.
pub const SIMILAR_BUSINESSES: RangeInclusive<u32> = 120..=340;

/// Greeting shown when there is no usable hand-off context.
pub const GENERIC_GREETING: &str = "Hi! I'm **Nuru**, the LocalOS intake assistant.\n\n\
Tell me a little about your business and the problem you're trying to solve, \
and I'll help you figure out the best next step.";

/// Maximum number of waste zones listed in the audit greeting.
const MAX_LISTED_ZONES: usize = 3;

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// Closing tier of the ROI greeting, from the reported risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// `low` and `medium` (any case) map to their tier; anything else is
    /// treated as high risk.
    pub fn from_level(level: &str) -> Self {
        match level.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "medium" | "moderate" => Self::Medium,
            _ => Self::High,
        }
    }

    fn closing(self) -> &'static str {
        match self {
            Self::Low => {
                "this one looks like a low-risk, high-return win. \
                 Want to map out what getting it live would take?"
            }
            Self::Medium => {
                "projects like this pay off when the rollout is staged carefully. \
                 Want to talk through where the risks sit?"
            }
            Self::High => {
                "the upside is real, but so is the risk. \
                 Let's pressure-test the assumptions before you commit to anything."
            }
        }
    }
}

/// Closing tier of the readiness greeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessTier {
    /// Score of 75 or more.
    GreatShape,
    /// Score of 50 up to 75.
    Developing,
    /// Score under 50.
    EarlyStage,
}

impl ReadinessTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            Self::GreatShape
        } else if score >= 50.0 {
            Self::Developing
        } else {
            Self::EarlyStage
        }
    }

    fn closing(self) -> &'static str {
        match self {
            Self::GreatShape => {
                "You're in great shape to start automating. \
                 Let's pick the first workflow that will pay off fastest."
            }
            Self::Developing => {
                "You have solid foundations with a few gaps to close. \
                 I can help you work out which ones matter most."
            }
            Self::EarlyStage => {
                "There's some groundwork to lay first, and that's completely normal. \
                 Let's find the quickest wins to get you ready."
            }
        }
    }
}

/// Closing tier of the audit greeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WasteTier {
    /// Score of 70 or more.
    Critical,
    /// Score of 40 up to 70.
    Moderate,
    /// Score under 40.
    Light,
}

impl WasteTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            Self::Critical
        } else if score >= 40.0 {
            Self::Moderate
        } else {
            Self::Light
        }
    }

    fn closing(self) -> &'static str {
        match self {
            Self::Critical => {
                "That's a lot of capacity leaking away. \
                 Let's start with the biggest zone and put a number on what fixing it is worth."
            }
            Self::Moderate => {
                "There's meaningful time to win back here. \
                 Which of these zones hurts the most day to day?"
            }
            Self::Light => {
                "You're running leaner than most. \
                 Let's see whether any of these zones is worth automating now."
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Synthesis
// ---------------------------------------------------------------------------

/// Greeting for the given context, using the thread-local RNG for flavour text.
pub fn synthesize_greeting(context: Option<&HandoffContext>) -> String {
    synthesize_greeting_with(context, &mut rand::thread_rng())
}

/// Greeting for the given context with a caller-supplied RNG.
pub fn synthesize_greeting_with<R: Rng>(
    context: Option<&HandoffContext>,
    rng: &mut R,
) -> String {
    match context {
        Some(HandoffContext::Roi(roi)) => roi_greeting(roi, rng.gen_range(SIMILAR_BUSINESSES)),
        Some(HandoffContext::Readiness(readiness)) => readiness_greeting(readiness),
        Some(HandoffContext::Audit(audit)) => audit_greeting(audit),
        Some(HandoffContext::Unrecognized) | None => GENERIC_GREETING.to_string(),
    }
}

fn roi_greeting(roi: &RoiContext, similar_businesses: u32) -> String {
    let process = non_empty_or(&roi.process_name, "your process");
    let closing = RiskTier::from_level(&roi.risk_level).closing();

    format!(
        "Welcome! I see you just ran the numbers on **{process}** in the ROI Projector.\n\n\
         Here's what stood out:\n\
         - **${savings}** in projected annual savings\n\
         - **{roi_pct}% ROI**\n\
         - Breakeven in about **{months} months**\n\n\
         I've analyzed {similar_businesses} similar businesses, and {closing}",
        savings = format_amount(roi.annual_savings),
        roi_pct = format_number(roi.roi_percentage),
        months = format_number(roi.breakeven_months),
    )
}

fn readiness_greeting(readiness: &ReadinessContext) -> String {
    let level = match readiness.readiness_level.trim() {
        "" => String::new(),
        level => format!(" ({level})"),
    };
    let closing = ReadinessTier::from_score(readiness.overall_score).closing();

    format!(
        "Welcome! Thanks for completing the AI Readiness Scan.\n\n\
         Your overall score is **{score}/100**{level}.\n\n\
         {closing}",
        score = format_number(readiness.overall_score),
    )
}

fn audit_greeting(audit: &AuditContext) -> String {
    let salutation = match audit.company_name.trim() {
        "" => "Welcome!".to_string(),
        name => format!("Welcome, {name}!"),
    };
    let closing = WasteTier::from_score(audit.waste_score).closing();

    let mut greeting = format!(
        "{salutation} I've reviewed your Intelligence Waste Audit.\n\n\
         Your waste score is **{score}/100**, roughly **{hours} hours** lost to low-value work.",
        score = format_number(audit.waste_score),
        hours = format_amount(audit.total_hours_wasted),
    );

    let zones: Vec<String> = audit
        .top_waste_zones
        .iter()
        .filter(|zone| !zone.name().trim().is_empty())
        .take(MAX_LISTED_ZONES)
        .map(|zone| match zone.hours() {
            Some(hours) => format!("- {} ({} hrs)", zone.name().trim(), format_amount(hours)),
            None => format!("- {}", zone.name().trim()),
        })
        .collect();

    if !zones.is_empty() {
        greeting.push_str("\n\nYour biggest waste zones:\n");
        greeting.push_str(&zones.join("\n"));
    }

    greeting.push_str("\n\n");
    greeting.push_str(closing);
    greeting
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    match value.trim() {
        "" => fallback,
        trimmed => trimmed,
    }
}

/// Whole number with thousands separators: `48250.4` → `48,250`.
fn format_amount(value: f64) -> String {
    let rounded = value.round();
    let digits = (rounded.abs() as u64).to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Integer when whole, otherwise one decimal: `4.0` → `4`, `4.26` → `4.3`.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
