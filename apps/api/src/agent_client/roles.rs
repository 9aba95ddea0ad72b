// Names the runtime's post-generation pipeline uses for its agents and for
// the session-state keys they write. These must match the deployed pipeline.

/// Session-state key written by the initial generator and the refiner.
pub const CURRENT_POST: &str = "current_post";
/// Session-state key written by the hashtag generator.
pub const SUGGESTED_HASHTAGS: &str = "suggested_hashtags";
/// Session-state key written by the visual finder.
pub const VISUAL_RECOMMENDATIONS: &str = "visual_recommendations";

/// Agents of the pipeline, in the order the runtime executes them
/// (hashtags and visuals run in parallel after the initial draft).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    InitialPostGenerator,
    HashtagGenerator,
    VisualFinder,
    PostReviewer,
    PostRefiner,
}

impl AgentRole {
    /// Maps a turn record's `author` tag to a role. Unknown authors yield `None`.
    pub fn from_author(author: &str) -> Option<Self> {
        match author {
            "InitialPostGenerator" => Some(AgentRole::InitialPostGenerator),
            "HashtagGenerator" => Some(AgentRole::HashtagGenerator),
            "VisualFinder" => Some(AgentRole::VisualFinder),
            "PostReviewer" => Some(AgentRole::PostReviewer),
            "PostRefinerAgent" => Some(AgentRole::PostRefiner),
            _ => None,
        }
    }

    pub fn author(self) -> &'static str {
        match self {
            AgentRole::InitialPostGenerator => "InitialPostGenerator",
            AgentRole::HashtagGenerator => "HashtagGenerator",
            AgentRole::VisualFinder => "VisualFinder",
            AgentRole::PostReviewer => "PostReviewer",
            AgentRole::PostRefiner => "PostRefinerAgent",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_tags_resolve_both_ways() {
        for role in [
            AgentRole::InitialPostGenerator,
            AgentRole::HashtagGenerator,
            AgentRole::VisualFinder,
            AgentRole::PostReviewer,
            AgentRole::PostRefiner,
        ] {
            assert_eq!(AgentRole::from_author(role.author()), Some(role));
        }
    }

    #[test]
    fn test_refiner_tag_keeps_agent_suffix() {
        assert_eq!(
            AgentRole::from_author("PostRefinerAgent"),
            Some(AgentRole::PostRefiner)
        );
        assert_eq!(AgentRole::from_author("PostRefiner"), None);
    }

    #[test]
    fn test_unknown_author_is_none() {
        assert_eq!(AgentRole::from_author("user"), None);
        assert_eq!(AgentRole::from_author(""), None);
    }
}
