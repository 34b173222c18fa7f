//! `lessonkit prompt`: print the assembled prompt.

use lessonkit_core::app::{AppEvent, AppState};
use lessonkit_core::prompt::{LessonConfig, TemplateKind};

/// Expand `template` for `config`. Templates without a body yield an empty
/// prompt and a notice on stderr.
pub fn render_prompt(config: LessonConfig, template: TemplateKind) -> (String, Option<String>) {
    let mut app = AppState::with_config(config);
    let notice = app.apply(AppEvent::TemplateSelected(template));
    (app.prompt().to_string(), notice.map(|n| n.message))
}

pub fn run_prompt(config: LessonConfig, template: TemplateKind) {
    let (prompt, notice) = render_prompt(config, template);
    if let Some(message) = notice {
        eprintln!("{message}");
    }
    if !prompt.is_empty() {
        println!("{prompt}");
    }
}

#[cfg(test)]
mod tests {
    use lessonkit_core::prompt::{AudienceTier, INCLUSIVE_CLAUSE};

    use super::*;

    #[test]
    fn lesson_plan_uses_form_values() {
        let config = LessonConfig {
            lesson_title: "Phân số".into(),
            period_count: "2".into(),
            audience: AudienceTier::InclusiveNeeds,
            ..LessonConfig::default()
        };
        let (prompt, notice) = render_prompt(config, TemplateKind::LessonPlan);
        assert!(notice.is_none());
        assert!(prompt.contains("Phân số"));
        assert!(prompt.contains("2 tiết"));
        assert!(prompt.contains(INCLUSIVE_CLAUSE));
    }

    #[test]
    fn empty_template_reports_notice() {
        let (prompt, notice) = render_prompt(LessonConfig::default(), TemplateKind::Slideshow);
        assert!(prompt.is_empty());
        assert!(notice.unwrap().contains(TemplateKind::Slideshow.label()));
    }
}
