//! Text rendered from an [`AssistantContext`]
//!
//! Everything here is a pure function of the context, so the same snapshot
//! always produces the same prompt and the same fallback.

use std::fmt::Write as _;

use super::builder::{AssistantContext, TimedValue};

const SYSTEM_PROMPT: &str = "You are an AI Carbon Intensity Assistant for the UK electricity grid. \
You help users understand carbon intensity data and make smart energy decisions.";

const STYLE_GUIDE: &str = "PERSONALITY & STYLE:
- Be friendly, helpful, and enthusiastic about clean energy
- Use emojis appropriately (🌱 for green energy, ⚡ for electricity, 🚗 for EVs, etc.)
- Provide specific, actionable advice with exact times when possible
- Keep responses concise but informative
- Use UK terminology and time formats (24-hour clock)

CAPABILITIES:
- Analyze 48-hour carbon intensity trends and forecasts
- Recommend optimal times for energy usage (EV charging, appliances) over the next 2 days
- Compare regional differences
- Explain renewable energy mix
- Calculate potential carbon savings over multiple days
- Provide cost-saving tips with specific timing
- Explain what affects carbon intensity patterns
- Identify the best and worst times over the next 48 hours

RESPONSE FORMAT:
- Start with a relevant emoji and brief summary
- Provide specific data points and recommendations with exact times
- Include actionable next steps when relevant
- For timing recommendations, always specify exact hours (e.g., \"02:00 tomorrow\")
- End with a helpful follow-up suggestion

TIMING RECOMMENDATIONS:
- Always provide specific times from the 48-hour forecast
- Mention both today and tomorrow's best/worst times
- Consider overnight periods for EV charging
- Account for typical usage patterns (avoid peak demand times)

Remember: Lower carbon intensity = cleaner electricity. Best times are when renewable energy is high and carbon intensity is low.";

/// One-line advice for the current intensity.
pub fn status_advice(intensity: f64) -> &'static str {
    if intensity < 200.0 {
        "🌱 Great time to use electricity - low carbon intensity!"
    } else if intensity < 300.0 {
        "⚡ Moderate carbon intensity - consider timing energy usage"
    } else {
        "🔥 High carbon intensity - try to reduce energy usage if possible"
    }
}

/// Advice line under a forecast outlook.
fn outlook_advice(intensity: f64) -> &'static str {
    if intensity < 200.0 {
        "🌱 Great time to use electricity right now!"
    } else {
        status_advice(intensity)
    }
}

fn slot_lines(out: &mut String, values: &[TimedValue]) {
    if values.is_empty() {
        out.push_str("- None in the forecast window\n");
    }
    for v in values {
        let _ = writeln!(out, "- {}: {:.0} gCO₂/kWh", v.label, v.intensity);
    }
}

fn average_text(avg: Option<f64>) -> String {
    avg.map_or_else(|| "Not available".to_string(), |a| format!("{a:.0} gCO₂/kWh"))
}

/// The forecast section of the prompt.
pub fn forecast_analysis(ctx: &AssistantContext) -> String {
    if !ctx.has_forecast() {
        return "No forecast data available".to_string();
    }

    let mut out = String::new();
    out.push_str("BEST TIMES (Lowest Carbon Intensity):\n");
    slot_lines(&mut out, &ctx.best);
    out.push_str("\nWORST TIMES (Highest Carbon Intensity):\n");
    slot_lines(&mut out, &ctx.worst);

    let _ = write!(
        out,
        "\nPERIOD AVERAGES:\n- Next {n} readings: {}\n- Following {n} readings: {}\n",
        average_text(ctx.next_period_avg),
        average_text(ctx.following_period_avg),
        n = ctx.period_length,
    );

    out.push_str("\nOVERNIGHT PERIODS (Good for EV charging):\n");
    slot_lines(&mut out, &ctx.overnight);
    out.truncate(out.trim_end().len());
    out
}

fn regional_section(ctx: &AssistantContext) -> Option<String> {
    let r = ctx.regional.as_ref()?;
    let mut out = format!(
        "REGIONAL COMPARISON:\n- Cleanest: {} ({:.0} gCO₂/kWh)\n- Dirtiest: {} ({:.0} gCO₂/kWh)\n- Average across {} regions: {:.0} gCO₂/kWh (spread {:.0})",
        r.cleanest.short_name,
        r.cleanest.forecast_intensity,
        r.dirtiest.short_name,
        r.dirtiest.forecast_intensity,
        r.ranking.len(),
        r.average_intensity,
        r.spread,
    );
    if ctx.location_enabled {
        out.push_str("\n- The user shares their location: relate advice to their region when relevant");
    }
    Some(out)
}

/// Full prompt: system prompt, data context, then the user question.
pub fn render_prompt(ctx: &AssistantContext, question: &str) -> String {
    let mut out = String::with_capacity(4096);
    let _ = write!(
        out,
        "{SYSTEM_PROMPT}\n\nCURRENT DATA CONTEXT:\n\
         - Current carbon intensity: {:.0} gCO₂/kWh ({})\n\
         - Renewable energy percentage: {:.1}%\n\
         - Low-carbon energy percentage: {:.1}%\n\
         - Fossil fuel percentage: {:.1}%\n\
         - Available forecast data for next 48 hours ({} data points)\n\n",
        ctx.current_intensity,
        ctx.current_level,
        ctx.renewable_pct,
        ctx.low_carbon_pct,
        ctx.fossil_pct,
        ctx.forecast_points,
    );
    let _ = write!(out, "48-HOUR FORECAST ANALYSIS:\n{}\n\n", forecast_analysis(ctx));
    if let Some(regional) = regional_section(ctx) {
        let _ = write!(out, "{regional}\n\n");
    }
    let _ = write!(
        out,
        "{STYLE_GUIDE}\n\nUser Question: {}\n\n\
         Please provide a helpful response based on the current UK carbon intensity data and 48-hour forecast.",
        question.trim()
    );
    out
}

fn current_status(ctx: &AssistantContext) -> String {
    format!(
        "**Current Status:**\n- Carbon intensity: {:.0} gCO₂/kWh\n- Renewable energy: {:.1}%",
        ctx.current_intensity, ctx.renewable_pct
    )
}

/// Local answer built only from analysis outputs, used when the assistant
/// endpoint cannot be reached.
pub fn fallback_text(ctx: &AssistantContext) -> String {
    let tz = ctx.tz();
    let mut out = String::from(
        "🤖 I'm having trouble connecting to my AI brain right now, but I can still help with the data!\n\n",
    );
    out.push_str(&current_status(ctx));

    let advice = match &ctx.outlook {
        Some(outlook) => {
            let _ = write!(
                out,
                "\n\n**48-Hour Outlook:**\n- Best time: {} ({:.0} gCO₂/kWh) 🌱\n- Worst time: {} ({:.0} gCO₂/kWh) 🔥",
                outlook.best.clock(&tz),
                outlook.best.intensity,
                outlook.worst.clock(&tz),
                outlook.worst.intensity,
            );
            outlook_advice(ctx.current_intensity)
        }
        None => status_advice(ctx.current_intensity),
    };
    let _ = write!(
        out,
        "\n\n{advice}\n\nTry asking me again in a moment, or ask about specific topics like EV charging, appliance timing, or regional comparisons."
    );
    out
}

/// Shown instead of an assistant call when no credential is configured.
pub fn unconfigured_text(ctx: &AssistantContext) -> String {
    format!(
        "🤖 AI Assistant is not configured. Please add your Gemini API key to use the AI features.\n\n\
         Based on the current data:\n- Carbon intensity: {:.0} gCO₂/kWh\n- Renewable energy: {:.1}%\n\n{}\n\n\
         To enable AI features, get a free API key from Google AI Studio and store it with PUT /api/v1/assistant/key.",
        ctx.current_intensity,
        ctx.renewable_pct,
        status_advice(ctx.current_intensity),
    )
}

/// Greeting with the current status and the forecast summary.
pub fn welcome_text(ctx: &AssistantContext) -> String {
    let summary = ctx
        .summary
        .as_ref()
        .map_or_else(|| "📊 No forecast data available".to_string(), |s| s.to_text());
    format!(
        "🌟 Hello! I'm your AI-powered Carbon Assistant, powered by Google Gemini.\n\n\
         **Current Status:**\n⚡ Carbon Intensity: {:.0} gCO₂/kWh\n🌱 Renewable Energy: {:.1}%\n\n\
         **48-Hour Forecast:**\n{summary}\n\n\
         I can help you:\n\
         • Find optimal times for EV charging over the next 2 days\n\
         • Plan energy-efficient appliance usage with specific timing\n\
         • Compare regional carbon intensity\n\
         • Understand renewable energy trends\n\
         • Calculate your carbon savings\n\
         • Provide detailed 48-hour energy planning\n\n\
         What would you like to know about UK energy today and tomorrow?",
        ctx.current_intensity, ctx.renewable_pct,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::context::{build_context, ContextInput};
    use crate::storage::UserSettings;
    use crate::types::IntensityReading;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap()
    }

    fn context_for(values: &[f64], current: Option<f64>) -> AssistantContext {
        let readings: Vec<IntensityReading> = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let from = start() + Duration::hours(i64::try_from(i).unwrap());
                IntensityReading::new(from, from + Duration::minutes(30), *v)
            })
            .collect();
        let current = current.map(|c| IntensityReading::new(start(), start(), c));
        let config = AnalysisConfig {
            timezone: "UTC".to_string(),
            ..AnalysisConfig::default()
        };
        build_context(
            &ContextInput {
                current: current.as_ref(),
                forecast: &readings,
                ..ContextInput::default()
            },
            &UserSettings::default(),
            &config,
            start(),
        )
    }

    #[test]
    fn test_status_advice_thresholds() {
        assert!(status_advice(199.0).starts_with("🌱"));
        assert!(status_advice(200.0).starts_with("⚡"));
        assert!(status_advice(299.0).starts_with("⚡"));
        assert!(status_advice(300.0).starts_with("🔥"));
    }

    #[test]
    fn test_prompt_sections_in_order() {
        let ctx = context_for(&[120.0, 60.0, 250.0], Some(180.0));
        let prompt = render_prompt(&ctx, "  When should I charge my EV?  ");

        let context_at = prompt.find("CURRENT DATA CONTEXT:").unwrap();
        let forecast_at = prompt.find("48-HOUR FORECAST ANALYSIS:").unwrap();
        let question_at = prompt.find("User Question: When should I charge my EV?").unwrap();
        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(context_at < forecast_at && forecast_at < question_at);
        assert!(prompt.contains("Current carbon intensity: 180 gCO₂/kWh (Low)"));
        assert!(prompt.contains("- Mon 01:00: 60 gCO₂/kWh"));
        assert!(prompt.contains("Following 24 readings: Not available"));
    }

    #[test]
    fn test_forecast_analysis_without_data() {
        let ctx = context_for(&[], None);
        assert_eq!(forecast_analysis(&ctx), "No forecast data available");
        assert!(render_prompt(&ctx, "hi").contains("No forecast data available"));
    }

    #[test]
    fn test_fallback_uses_next_period() {
        let ctx = context_for(&[150.0, 90.0, 310.0], Some(320.0));
        let text = fallback_text(&ctx);
        assert!(text.contains("Best time: 01:00 (90 gCO₂/kWh)"));
        assert!(text.contains("Worst time: 02:00 (310 gCO₂/kWh)"));
        assert!(text.contains("🔥 High carbon intensity"));
    }

    #[test]
    fn test_fallback_without_forecast_still_has_status() {
        let ctx = context_for(&[], Some(120.0));
        let text = fallback_text(&ctx);
        assert!(text.contains("Carbon intensity: 120 gCO₂/kWh"));
        assert!(!text.contains("Outlook"));
        assert!(text.contains("🌱 Great time to use electricity - low carbon intensity!"));
    }

    #[test]
    fn test_fallback_outlook_wording() {
        let ctx = context_for(&[150.0, 90.0, 310.0], Some(120.0));
        let text = fallback_text(&ctx);
        assert!(text.contains("**48-Hour Outlook:**\n- Best time: 01:00 (90 gCO₂/kWh) 🌱"));
        assert!(text.contains("\n\n🌱 Great time to use electricity right now!\n\n"));
        assert!(!text.contains("low carbon intensity!"));
    }

    #[test]
    fn test_unconfigured_and_welcome() {
        let ctx = context_for(&[150.0, 90.0], Some(250.0));
        assert!(unconfigured_text(&ctx).contains("not configured"));
        assert!(unconfigured_text(&ctx).contains("⚡ Moderate"));

        let welcome = welcome_text(&ctx);
        assert!(welcome.contains("📈 Best: Today 01:00 (90 gCO₂/kWh)"));
        assert!(welcome.contains("📉 Worst: Today 00:00 (150 gCO₂/kWh)"));

        let empty = context_for(&[], None);
        assert!(welcome_text(&empty).contains("📊 No forecast data available"));
    }
}
