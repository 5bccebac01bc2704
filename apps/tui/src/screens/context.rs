//! "Context" screen: session identifier and the resolved hand-off context.

use crossterm::event::{KeyCode, KeyModifiers};
use nuru_shared::{HandoffContext, ResolvedContext};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use super::Action;

pub(crate) struct ContextScreen {
    summary: Vec<(String, String)>,
    raw: Vec<String>,
    scroll: u16,
}

impl ContextScreen {
    pub(crate) fn new(session_id: &str, backend: &str, context: Option<&ResolvedContext>) -> Self {
        let mut summary = vec![
            ("Session".to_string(), session_id.to_string()),
            ("Backend".to_string(), backend.to_string()),
        ];

        let raw = match context {
            Some(resolved) => {
                summary.push(("Source".into(), resolved.source.clone()));
                summary.push(("Kind".into(), resolved.context.kind().into()));
                summary.extend(context_fields(&resolved.context));
                serde_json::to_string_pretty(&resolved.raw)
                    .unwrap_or_else(|_| resolved.raw.to_string())
                    .lines()
                    .map(String::from)
                    .collect()
            }
            None => {
                summary.push(("Source".into(), "none".into()));
                vec!["No hand-off context for this view.".to_string()]
            }
        };

        Self {
            summary,
            raw,
            scroll: 0,
        }
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect) {
        let rows = u16::try_from(self.summary.len()).unwrap_or(u16::MAX);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(rows.saturating_add(2)), // Summary
                Constraint::Min(3),                         // Raw JSON
            ])
            .split(area);

        let summary: Vec<Line> = self
            .summary
            .iter()
            .map(|(label, value)| {
                Line::from(vec![
                    Span::styled(
                        format!("{label:<14}"),
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(value.clone()),
                ])
            })
            .collect();
        f.render_widget(
            Paragraph::new(summary).block(Block::default().borders(Borders::ALL).title(" Session ")),
            chunks[0],
        );

        let raw: Vec<Line> = self.raw.iter().map(|l| Line::from(l.as_str())).collect();
        f.render_widget(
            Paragraph::new(raw)
                .scroll((self.scroll, 0))
                .block(Block::default().borders(Borders::ALL).title(" Raw context ")),
            chunks[1],
        );
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, _modifiers: KeyModifiers) -> Action {
        match code {
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Home => self.scroll = 0,
            _ => {}
        }
        Action::None
    }
}

fn context_fields(context: &HandoffContext) -> Vec<(String, String)> {
    match context {
        HandoffContext::Roi(roi) => vec![
            ("Process".into(), roi.process_name.clone()),
            ("Savings".into(), format!("${:.0}", roi.annual_savings)),
            ("ROI".into(), format!("{}%", roi.roi_percentage)),
            ("Breakeven".into(), format!("{} months", roi.breakeven_months)),
            ("Risk".into(), roi.risk_level.clone()),
        ],
        HandoffContext::Readiness(readiness) => vec![
            ("Score".into(), format!("{}/100", readiness.overall_score)),
            ("Level".into(), readiness.readiness_level.clone()),
        ],
        HandoffContext::Audit(audit) => vec![
            ("Company".into(), audit.company_name.clone()),
            ("Waste score".into(), format!("{}/100", audit.waste_score)),
            ("Hours wasted".into(), format!("{}", audit.total_hours_wasted)),
            (
                "Top zones".into(),
                audit
                    .top_waste_zones
                    .iter()
                    .map(|zone| zone.name().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        ],
        HandoffContext::Unrecognized => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn summary_without_context() {
        let screen = ContextScreen::new("session_1", "http://localhost:5000", None);
        assert_eq!(screen.summary[0], ("Session".into(), "session_1".into()));
        assert_eq!(screen.summary[2], ("Source".into(), "none".into()));
    }

    #[test]
    fn summary_with_readiness_context() {
        let resolved = ResolvedContext::new(
            "readiness-scanner",
            json!({ "overall_score": 65, "readiness_level": "Developing" }),
        );
        let screen = ContextScreen::new("session_1", "http://localhost:5000", Some(&resolved));

        assert!(screen.summary.contains(&("Kind".into(), "readiness".into())));
        assert!(screen.summary.contains(&("Score".into(), "65/100".into())));
        assert!(screen.raw.iter().any(|l| l.contains("\"overall_score\": 65")));
    }
}
