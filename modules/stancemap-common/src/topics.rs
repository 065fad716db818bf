use std::collections::HashMap;

use crate::error::StanceMapError;
use crate::types::TopicDefinition;

/// Built-in topic list used when no topics file is configured.
pub fn default_topics() -> Vec<TopicDefinition> {
    [
        (
            "Ukraine Conflict",
            "Support for Ukraine, condemnation of Russia, sanctions, military aid",
        ),
        (
            "Israel/Gaza Conflict",
            "Support for Israel, support for Palestinians, ceasefire calls, humanitarian aid",
        ),
        (
            "Iran",
            "Nuclear program concerns, sanctions, diplomatic relations, regional tensions",
        ),
        (
            "Climate Change",
            "Paris Agreement, net zero commitments, climate finance, green transition",
        ),
        (
            "Human Rights",
            "Democracy promotion, authoritarian criticism, minority rights, women's rights",
        ),
        (
            "Sanctions",
            "Economic sanctions, trade restrictions, financial penalties, embargo measures",
        ),
        (
            "Tariffs",
            "Trade tariffs, customs duties, import taxes, trade barriers, protectionist measures",
        ),
        (
            "Artificial Intelligence",
            "AI governance, regulation, ethics, development policies, international cooperation",
        ),
    ]
    .into_iter()
    .map(|(name, description)| TopicDefinition::new(name, description))
    .collect()
}

/// Lowercase, every character outside `[a-z0-9]` replaced by `_`.
///
/// Used as the cache key for topic result files.
pub fn topic_slug(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Reject empty lists and topics whose slugs collide, since they would share
/// one cache file.
pub fn validate_topics(topics: &[TopicDefinition]) -> Result<(), StanceMapError> {
    if topics.is_empty() {
        return Err(StanceMapError::Config("topic list is empty".into()));
    }

    let mut seen: HashMap<String, &str> = HashMap::new();
    for topic in topics {
        if topic.name.trim().is_empty() {
            return Err(StanceMapError::Config("topic with empty name".into()));
        }
        let slug = topic_slug(&topic.name);
        if let Some(previous) = seen.insert(slug.clone(), &topic.name) {
            return Err(StanceMapError::Config(format!(
                "topics \"{previous}\" and \"{}\" share the slug \"{slug}\"",
                topic.name
            )));
        }
    }
    Ok(())
}
