use tera::{Context, Tera};

use crate::engine::resolve::Resolution;
use crate::engine::score::format_percent;
use crate::error::Error;
use crate::survey::types::Survey;

const REPORT_TEMPLATE_NAME: &str = "report.txt";
const REPORT_TEMPLATE: &str = r#"Survey: {{ survey_title }}
Mode: {{ mode }}
Score: {{ score }} / {{ total }} ({{ percent }})
{% for tier in tiers -%}
Top {{ tier.tagId }}: {{ tier.tags | join(sep=", ") }}
{% endfor -%}
{% if result -%}
Result: {{ result.title }} [{{ result.id }}]
{% for component in result.components -%}
{% if component.text %}  {{ component.text }}
{% endif -%}
{% if component.image %}  image: {{ component.image }}
{% endif -%}
{% endfor -%}
{% else -%}
Result: none matched
{% endif -%}
"#;

/// Renders a plain text summary of a resolved outcome.
pub fn render_report(survey: &Survey, resolution: &Resolution) -> Result<String, Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(REPORT_TEMPLATE_NAME, REPORT_TEMPLATE)?;

    let result = resolution
        .result_id
        .as_deref()
        .and_then(|id| survey.find_result(id));

    let survey_title = if survey.title.is_empty() {
        survey.id.as_str()
    } else {
        survey.title.as_str()
    };

    let mut ctx = Context::new();
    ctx.insert("survey_title", survey_title);
    ctx.insert("mode", resolution.mode.as_str());
    ctx.insert("score", &resolution.score.score);
    ctx.insert("total", &resolution.score.total);
    ctx.insert("percent", &format_percent(&resolution.score));
    ctx.insert("tiers", &resolution.tiers);
    ctx.insert("result", &result);

    Ok(tera.render(REPORT_TEMPLATE_NAME, &ctx)?)
}

#[cfg(test)]
mod tests {
    use super::render_report;
    use crate::engine::resolve::Resolution;
    use crate::engine::score::Score;
    use crate::engine::tags::TagTier;
    use crate::survey::format::format_survey;
    use crate::survey::types::ResultMode;

    const SURVEY: &str = r#"{"id":"s1","title":"Shopper quiz","results":{"list":{
      "r1":{"title":"Bold","components":[{"type":"text","text":"<b>Go big</b>"},{"type":"image","src":"bold.png"}]}
    }}}"#;

    #[test]
    fn renders_matched_result_with_components() {
        let survey = format_survey(SURVEY).expect("format survey");
        let resolution = Resolution {
            mode: ResultMode::Tag,
            result_id: Some("r1".to_string()),
            score: Score::default(),
            tiers: vec![TagTier {
                tag_id: "style".to_string(),
                tags: vec!["bold".to_string(), "loud".to_string()],
            }],
        };
        let report = render_report(&survey, &resolution).expect("render");
        assert!(report.contains("Survey: Shopper quiz"));
        assert!(report.contains("Score: 0 / 0 (—)"));
        assert!(report.contains("Top style: bold, loud"));
        assert!(report.contains("Result: Bold [r1]"));
        assert!(report.contains("  Go big"));
        assert!(report.contains("  image: bold.png"));
    }

    #[test]
    fn renders_no_result_as_a_line() {
        let survey = format_survey(SURVEY).expect("format survey");
        let resolution = Resolution {
            mode: ResultMode::Score,
            result_id: None,
            score: Score { score: 1, total: 4 },
            tiers: vec![],
        };
        let report = render_report(&survey, &resolution).expect("render");
        assert!(report.contains("Score: 1 / 4 (25%)"));
        assert!(report.contains("Result: none matched"));
    }
}
