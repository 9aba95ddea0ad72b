//! Extraction stages: pure functions that each pull whatever they can find
//! out of one upstream shape.
//!
//! Every stage returns an `Extraction` whose fields are `None` when the stage
//! found nothing usable. Missing keys, wrong JSON types, and blank strings
//! are all "not found"; no stage can fail.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::agent_client::roles::{
    AgentRole, CURRENT_POST, SUGGESTED_HASHTAGS, VISUAL_RECOMMENDATIONS,
};

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\w+").expect("valid hashtag regex"));

/// A heading such as `**Recommended Visual:** ...`, `## Visual: ...` or
/// `Visual suggestion: ...`. Group 1 is the label before the colon, group 2
/// whatever follows it on the same line (possibly empty).
static VISUAL_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:#{1,6}[ \t]*|\*\*|__)?[ \t]*((?:[a-z]+[ \t]+)?visuals?(?:[ \t]+[a-z]+)*)[ \t]*:(?:\*\*|__)?[ \t]*(.*)$",
    )
    .expect("valid visual line regex")
});

/// Label words marking a heading that talks about visuals without
/// recommending one (`KEY VISUAL CONCEPTS`, `VISUAL STRATEGY`, ...).
const NON_SUGGESTION_LABEL_WORDS: &[&str] = &["concept", "concepts", "query", "strategy"];

/// Spellings of the visual-recommendations key seen across runtime versions.
const ALTERNATE_VISUAL_KEYS: &[&str] = &[
    "visual_recommendations",
    "visualRecommendations",
    "visual_suggestions",
    "visualSuggestions",
    "visuals",
];

// ────────────────────────────────────────────────────────────────────────────
// Partial result
// ────────────────────────────────────────────────────────────────────────────

/// What one stage recovered. `None` means "not found here".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub post: Option<String>,
    pub hashtags: Option<Vec<String>>,
    pub visuals: Option<Vec<String>>,
}

impl Extraction {
    /// Fills only the fields still missing.
    pub fn fill_from(&mut self, other: Extraction) {
        if self.post.is_none() {
            self.post = other.post;
        }
        if self.hashtags.is_none() {
            self.hashtags = other.hashtags;
        }
        if self.visuals.is_none() {
            self.visuals = other.visuals;
        }
    }

    /// Replaces every field the other extraction found.
    pub fn override_with(&mut self, other: Extraction) {
        if other.post.is_some() {
            self.post = other.post;
        }
        if other.hashtags.is_some() {
            self.hashtags = other.hashtags;
        }
        if other.visuals.is_some() {
            self.visuals = other.visuals;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field readers
// ────────────────────────────────────────────────────────────────────────────

/// Every `#word` token in first-occurrence order. Duplicates are kept.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    HASHTAG_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// The first visual suggestion found under a visual heading.
///
/// Text on the heading line wins. A heading with nothing after the colon is
/// followed into its bullet block, where a `Description` bullet is preferred
/// over the first bullet.
pub fn extract_visual_line(text: &str) -> Option<String> {
    VISUAL_LINE_RE.captures_iter(text).find_map(|caps| {
        let label = caps.get(1)?.as_str();
        if is_non_suggestion_label(label) {
            return None;
        }

        let inline = caps
            .get(2)?
            .as_str()
            .trim_matches(|c: char| c == '*' || c == '_' || c.is_whitespace());
        match non_blank(inline) {
            Some(line) => Some(line.to_string()),
            None => visual_from_bullets(&text[caps.get(0)?.end()..]),
        }
    })
}

fn is_non_suggestion_label(label: &str) -> bool {
    label
        .split_whitespace()
        .any(|word| NON_SUGGESTION_LABEL_WORDS.contains(&word.to_lowercase().as_str()))
}

/// Reads the `- ...` bullet block right below a heading.
fn visual_from_bullets(after_heading: &str) -> Option<String> {
    let bullets: Vec<String> = after_heading
        .lines()
        .skip_while(|line| line.trim().is_empty())
        .map_while(|line| {
            let line = line.trim();
            line.strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .map(|item| item.replace("**", "").replace("__", ""))
        })
        .collect();

    let description = bullets.iter().find_map(|item| {
        let (label, value) = item.split_once(':')?;
        if label.trim().eq_ignore_ascii_case("description") {
            non_blank(value).map(|v| v.trim().to_string())
        } else {
            None
        }
    });

    description.or_else(|| {
        bullets.iter().find_map(|item| {
            let value = item.split_once(':').map_or(item.as_str(), |(_, value)| value);
            non_blank(value).map(|v| v.trim().to_string())
        })
    })
}

fn non_blank(s: &str) -> Option<&str> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// A post is a non-blank string, kept verbatim.
fn read_post(value: &Value) -> Option<String> {
    value.as_str().and_then(non_blank).map(str::to_string)
}

/// Hashtags from a string, or from an array of strings joined by spaces.
fn read_hashtags(value: &Value) -> Option<Vec<String>> {
    let source = match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        _ => return None,
    };
    let tags = extract_hashtags(&source);
    (!tags.is_empty()).then_some(tags)
}

/// A string becomes a single suggestion; an array keeps its string items.
fn read_visuals(value: &Value) -> Option<Vec<String>> {
    let visuals: Vec<String> = match value {
        Value::String(s) => non_blank(s).map(|s| vec![s.to_string()])?,
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(non_blank)
            .map(str::to_string)
            .collect(),
        _ => return None,
    };
    (!visuals.is_empty()).then_some(visuals)
}

/// Reads the three well-known keys from a flat state object.
fn read_state_object(state: &Value) -> Extraction {
    Extraction {
        post: state.get(CURRENT_POST).and_then(read_post),
        hashtags: state.get(SUGGESTED_HASHTAGS).and_then(read_hashtags),
        visuals: state.get(VISUAL_RECOMMENDATIONS).and_then(read_visuals),
    }
}

/// A turn record's state delta: `actions.state_delta`, `actions.stateDelta`,
/// or a top-level `state_delta`, in that order.
fn state_delta(record: &Value) -> Option<&Value> {
    let actions = record.get("actions");
    actions
        .and_then(|a| a.get("state_delta"))
        .or_else(|| actions.and_then(|a| a.get("stateDelta")))
        .or_else(|| record.get("state_delta"))
        .filter(|delta| delta.is_object())
}

/// A turn record's message text: the first non-blank `content.parts[].text`,
/// or `content` itself when the runtime sent a bare string.
fn message_text(record: &Value) -> Option<&str> {
    let content = record.get("content")?;
    if let Some(text) = content.as_str() {
        return non_blank(text);
    }
    content
        .get("parts")?
        .as_array()?
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .find_map(non_blank)
}

// ────────────────────────────────────────────────────────────────────────────
// Stages
// ────────────────────────────────────────────────────────────────────────────

/// Everything the stages may look at for one request.
#[derive(Debug, Clone, Copy)]
pub struct Sources<'a> {
    /// Answer of the session-state endpoint, if the read succeeded.
    pub session_state: Option<&'a Value>,
    /// Body of the run call.
    pub raw: &'a Value,
}

/// Session-state endpoint: the committed state after the run.
pub fn from_session_state(sources: &Sources<'_>) -> Extraction {
    sources
        .session_state
        .map(read_state_object)
        .unwrap_or_default()
}

/// The run body's own `state` object.
pub fn from_embedded_state(sources: &Sources<'_>) -> Extraction {
    sources
        .raw
        .get("state")
        .map(read_state_object)
        .unwrap_or_default()
}

/// The last turn record's message text, taken verbatim as the post and
/// scanned for hashtags and a visual heading line.
pub fn from_last_turn(sources: &Sources<'_>) -> Extraction {
    let Some(text) = sources
        .raw
        .as_array()
        .and_then(|turns| turns.last())
        .and_then(message_text)
    else {
        return Extraction::default();
    };

    let hashtags = extract_hashtags(text);
    Extraction {
        post: Some(text.to_string()),
        hashtags: (!hashtags.is_empty()).then_some(hashtags),
        visuals: extract_visual_line(text).map(|v| vec![v]),
    }
}

/// Every turn record attributed to the refiner, hashtag or visual agent.
/// Later records overwrite earlier ones field by field.
pub fn from_attributed_turns(sources: &Sources<'_>) -> Extraction {
    let mut found = Extraction::default();
    let Some(turns) = sources.raw.as_array() else {
        return found;
    };

    for record in turns {
        let Some(role) = record
            .get("author")
            .and_then(Value::as_str)
            .and_then(AgentRole::from_author)
        else {
            continue;
        };
        let Some(delta) = state_delta(record) else {
            continue;
        };

        let update = match role {
            AgentRole::PostRefiner => Extraction {
                post: delta.get(CURRENT_POST).and_then(read_post),
                ..Default::default()
            },
            AgentRole::HashtagGenerator => Extraction {
                hashtags: delta.get(SUGGESTED_HASHTAGS).and_then(read_hashtags),
                ..Default::default()
            },
            AgentRole::VisualFinder => Extraction {
                visuals: delta.get(VISUAL_RECOMMENDATIONS).and_then(read_visuals),
                ..Default::default()
            },
            AgentRole::InitialPostGenerator | AgentRole::PostReviewer => continue,
        };
        if update != Extraction::default() {
            debug!("State delta from {} applied", role.author());
        }
        found.override_with(update);
    }

    found
}

/// Visuals under any known alternate key, looked up in the run body's `state`
/// object first and then at its top level.
pub fn from_alternate_visual_keys(sources: &Sources<'_>) -> Option<Vec<String>> {
    [sources.raw.get("state"), Some(sources.raw)]
        .into_iter()
        .flatten()
        .filter(|container| container.is_object())
        .find_map(|container| {
            ALTERNATE_VISUAL_KEYS
                .iter()
                .find_map(|key| container.get(*key).and_then(read_visuals))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sources<'a>(session_state: Option<&'a Value>, raw: &'a Value) -> Sources<'a> {
        Sources { session_state, raw }
    }

    // ── hashtags ────────────────────────────────────────────────────────────

    #[test]
    fn test_hashtags_keep_duplicates_and_order() {
        assert_eq!(extract_hashtags("#one #one #two"), vec!["#one", "#one", "#two"]);
    }

    #[test]
    fn test_hashtags_inside_prose() {
        assert_eq!(
            extract_hashtags("Check out #AI and #Growth today"),
            vec!["#AI", "#Growth"]
        );
    }

    #[test]
    fn test_bare_hash_is_not_a_hashtag() {
        assert!(extract_hashtags("## Heading # alone").is_empty());
    }

    #[test]
    fn test_hashtag_array_is_joined() {
        let tags = read_hashtags(&json!(["#Rust", "not a tag", "#Systems #Perf"]));
        assert_eq!(
            tags,
            Some(vec!["#Rust".to_string(), "#Systems".to_string(), "#Perf".to_string()])
        );
    }

    #[test]
    fn test_hashtag_source_without_tags_is_not_found() {
        assert_eq!(read_hashtags(&json!("no tags here")), None);
        assert_eq!(read_hashtags(&json!(42)), None);
    }

    // ── visuals ─────────────────────────────────────────────────────────────

    #[test]
    fn test_visual_line_variants() {
        assert_eq!(
            extract_visual_line("Intro\n**Recommended Visual:** Team photo at a whiteboard\nOutro"),
            Some("Team photo at a whiteboard".to_string())
        );
        assert_eq!(
            extract_visual_line("## Visual Suggestion: Bar chart of adoption"),
            Some("Bar chart of adoption".to_string())
        );
        assert_eq!(
            extract_visual_line("visual: a lighthouse"),
            Some("a lighthouse".to_string())
        );
    }

    #[test]
    fn test_visual_heading_without_text_or_bullets_is_ignored() {
        assert_eq!(extract_visual_line("**RECOMMENDED VISUAL:**\n\nThanks!"), None);
        assert_eq!(extract_visual_line("Nothing visual about this line"), None);
    }

    #[test]
    fn test_visual_concepts_heading_is_not_a_suggestion() {
        let text = "**SEARCH QUERY USED:** ai hiring visuals\n\
                    **KEY VISUAL CONCEPTS:** fairness, speed, data\n\
                    **VISUAL STRATEGY:** Builds trust";
        assert_eq!(extract_visual_line(text), None);
    }

    #[test]
    fn test_visual_finder_report_reads_description_bullet() {
        let text = "**SEARCH QUERY USED:** ai hiring infographic\n\n\
                    **KEY VISUAL CONCEPTS:** fairness, speed, data\n\n\
                    **RECOMMENDED VISUAL:**\n\
                    - **Type:** infographic\n\
                    - **Description:** Funnel showing screening time drop\n\
                    - **Usage:** Attach as the post image\n\n\
                    **VISUAL STRATEGY:** Numbers stop the scroll";
        assert_eq!(
            extract_visual_line(text),
            Some("Funnel showing screening time drop".to_string())
        );
    }

    #[test]
    fn test_visual_bullets_without_description_use_first_bullet() {
        assert_eq!(
            extract_visual_line("**RECOMMENDED VISUAL:**\n- Type: photo\n- Usage: header"),
            Some("photo".to_string())
        );
    }

    #[test]
    fn test_visual_string_wraps_as_single_suggestion() {
        assert_eq!(
            read_visuals(&json!("An infographic")),
            Some(vec!["An infographic".to_string()])
        );
        assert_eq!(read_visuals(&json!("   ")), None);
        assert_eq!(read_visuals(&json!({ "type": "photo" })), None);
    }

    // ── stages ──────────────────────────────────────────────────────────────

    #[test]
    fn test_session_state_stage_reads_all_fields() {
        let state = json!({
            "current_post": "Hello",
            "suggested_hashtags": "#AI #ML",
            "visual_recommendations": "A chart"
        });
        let raw = Value::Null;
        let found = from_session_state(&sources(Some(&state), &raw));
        assert_eq!(found.post.as_deref(), Some("Hello"));
        assert_eq!(found.hashtags, Some(vec!["#AI".to_string(), "#ML".to_string()]));
        assert_eq!(found.visuals, Some(vec!["A chart".to_string()]));
    }

    #[test]
    fn test_session_state_stage_tolerates_wrong_types() {
        let state = json!({ "current_post": 7, "suggested_hashtags": null, "visual_recommendations": [] });
        let raw = Value::Null;
        assert_eq!(
            from_session_state(&sources(Some(&state), &raw)),
            Extraction::default()
        );
        assert_eq!(from_session_state(&sources(None, &raw)), Extraction::default());
    }

    #[test]
    fn test_embedded_state_stage() {
        let raw = json!({ "state": { "current_post": "Embedded" } });
        let found = from_embedded_state(&sources(None, &raw));
        assert_eq!(found.post.as_deref(), Some("Embedded"));
        assert_eq!(found.hashtags, None);
    }

    #[test]
    fn test_embedded_state_stage_ignores_non_object_state() {
        let raw = json!({ "state": "oops" });
        assert_eq!(from_embedded_state(&sources(None, &raw)), Extraction::default());
    }

    #[test]
    fn test_last_turn_stage_uses_message_text() {
        let raw = json!([
            { "author": "InitialPostGenerator", "content": { "parts": [{ "text": "Draft" }] } },
            { "author": "PostReviewer", "content": { "parts": [
                { "function_call": { "name": "count_characters" } },
                { "text": "Final words #Rust\n## Visual: Ferris on a desk" }
            ] } }
        ]);
        let found = from_last_turn(&sources(None, &raw));
        assert_eq!(
            found.post.as_deref(),
            Some("Final words #Rust\n## Visual: Ferris on a desk")
        );
        assert_eq!(found.hashtags, Some(vec!["#Rust".to_string()]));
        assert_eq!(found.visuals, Some(vec!["Ferris on a desk".to_string()]));
    }

    #[test]
    fn test_last_turn_stage_without_text_finds_nothing() {
        let raw = json!([{ "author": "HashtagGenerator", "actions": { "state_delta": {} } }]);
        assert_eq!(from_last_turn(&sources(None, &raw)), Extraction::default());
        let raw = json!({ "not": "an array" });
        assert_eq!(from_last_turn(&sources(None, &raw)), Extraction::default());
    }

    #[test]
    fn test_attributed_stage_reads_each_role() {
        let raw = json!([
            { "author": "InitialPostGenerator", "actions": { "state_delta": { "current_post": "Draft" } } },
            { "author": "HashtagGenerator", "actions": { "state_delta": { "suggested_hashtags": "Check out #AI and #Growth today" } } },
            { "author": "VisualFinder", "actions": { "stateDelta": { "visual_recommendations": "Stock photo of a team" } } },
            { "author": "PostRefinerAgent", "state_delta": { "current_post": "Refined" } }
        ]);
        let found = from_attributed_turns(&sources(None, &raw));
        assert_eq!(found.post.as_deref(), Some("Refined"));
        assert_eq!(found.hashtags, Some(vec!["#AI".to_string(), "#Growth".to_string()]));
        assert_eq!(found.visuals, Some(vec!["Stock photo of a team".to_string()]));
    }

    #[test]
    fn test_attributed_stage_latest_record_wins() {
        let raw = json!([
            { "author": "PostRefinerAgent", "actions": { "state_delta": { "current_post": "First pass" } } },
            { "author": "PostRefinerAgent", "actions": { "state_delta": { "current_post": "Second pass" } } },
            { "author": "PostRefinerAgent", "actions": { "state_delta": { "current_post": "" } } }
        ]);
        let found = from_attributed_turns(&sources(None, &raw));
        assert_eq!(found.post.as_deref(), Some("Second pass"));
    }

    #[test]
    fn test_attributed_stage_ignores_unattributed_and_malformed_records() {
        let raw = json!([
            "not a record",
            { "author": "SomeoneElse", "actions": { "state_delta": { "current_post": "Nope" } } },
            { "author": "PostRefinerAgent", "actions": { "state_delta": "not an object" } },
            { "author": "InitialPostGenerator", "actions": { "state_delta": { "current_post": "Draft" } } }
        ]);
        assert_eq!(from_attributed_turns(&sources(None, &raw)), Extraction::default());
    }

    #[test]
    fn test_alternate_keys_prefer_state_over_top_level() {
        let raw = json!({
            "visualSuggestions": ["top level"],
            "state": { "visualRecommendations": "from state" }
        });
        assert_eq!(
            from_alternate_visual_keys(&sources(None, &raw)),
            Some(vec!["from state".to_string()])
        );
    }

    #[test]
    fn test_alternate_keys_fall_back_to_top_level() {
        let raw = json!({ "visuals": ["Chart", "Photo"] });
        assert_eq!(
            from_alternate_visual_keys(&sources(None, &raw)),
            Some(vec!["Chart".to_string(), "Photo".to_string()])
        );
        let raw = json!([{ "visuals": "inside a turn" }]);
        assert_eq!(from_alternate_visual_keys(&sources(None, &raw)), None);
    }

    #[test]
    fn test_fill_and_override_semantics() {
        let mut merged = Extraction {
            post: Some("kept".into()),
            ..Default::default()
        };
        merged.fill_from(Extraction {
            post: Some("ignored".into()),
            hashtags: Some(vec!["#new".into()]),
            visuals: None,
        });
        assert_eq!(merged.post.as_deref(), Some("kept"));
        assert_eq!(merged.hashtags, Some(vec!["#new".to_string()]));

        merged.override_with(Extraction {
            post: Some("replaced".into()),
            hashtags: None,
            visuals: None,
        });
        assert_eq!(merged.post.as_deref(), Some("replaced"));
        assert_eq!(merged.hashtags, Some(vec!["#new".to_string()]));
    }
}
