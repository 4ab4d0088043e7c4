use glif_core::config::TriggerConfig;
use glif_core::error::BridgeError;

/// Trigger phrase to glif model lookup, in configuration order.
#[derive(Debug, Clone)]
pub struct TriggerTable {
    entries: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route<'a> {
    pub trigger: &'a str,
    pub model_id: &'a str,
    pub remainder: &'a str,
}

impl TriggerTable {
    pub fn from_config(triggers: &[TriggerConfig]) -> Result<Self, BridgeError> {
        let mut entries: Vec<(String, String)> = Vec::new();
        for trigger in triggers {
            for phrase in &trigger.phrases {
                if phrase.is_empty() {
                    return Err(BridgeError::InvalidConfig(format!(
                        "empty trigger phrase for model {}",
                        trigger.model_id
                    )));
                }
                if entries.iter().any(|(p, _)| p == phrase) {
                    return Err(BridgeError::InvalidConfig(format!(
                        "duplicate trigger phrase: {phrase}"
                    )));
                }
                entries.push((phrase.clone(), trigger.model_id.clone()));
            }
        }
        if entries.is_empty() {
            return Err(BridgeError::InvalidConfig("no triggers configured".to_string()));
        }
        Ok(Self { entries })
    }

    /// First phrase (in table order) that `text` starts with wins, even when a
    /// longer phrase would also match.
    pub fn route<'a>(&'a self, text: &'a str) -> Option<Route<'a>> {
        self.entries.iter().find_map(|(phrase, model_id)| {
            text.strip_prefix(phrase.as_str()).map(|remainder| Route {
                trigger: phrase.as_str(),
                model_id: model_id.as_str(),
                remainder,
            })
        })
    }

    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    pub fn help_text(&self) -> String {
        let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
        for (phrase, model_id) in &self.entries {
            match groups.iter_mut().find(|(id, _)| *id == model_id.as_str()) {
                Some((_, phrases)) => phrases.push(phrase.as_str()),
                None => groups.push((model_id.as_str(), vec![phrase.as_str()])),
            }
        }
        let triggers = groups
            .iter()
            .map(|(_, phrases)| phrases.join("、"))
            .collect::<Vec<_>>()
            .join(" | ");
        let example = self.phrases().next().unwrap_or_default();

        let mut out = String::from("Image generation usage:\n");
        out.push_str("1. Start a message with one of the trigger phrases:\n");
        out.push_str(&format!("   {triggers}\n"));
        out.push_str("2. Aspect ratio:\n");
        out.push_str("   append '--ar W:H' (1:1, 16:9, 9:16, 4:3, 3:4; default 1:1)\n");
        out.push_str("3. Examples:\n");
        out.push_str(&format!("   {example} making dumplings\n"));
        out.push_str(&format!("   {example} drinking coffee --ar 9:16\n"));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(spec: &[(&str, &[&str])]) -> TriggerTable {
        let cfgs: Vec<TriggerConfig> = spec
            .iter()
            .map(|(id, phrases)| TriggerConfig {
                model_id: id.to_string(),
                phrases: phrases.iter().map(|p| p.to_string()).collect(),
            })
            .collect();
        TriggerTable::from_config(&cfgs).unwrap()
    }

    #[test]
    fn every_phrase_routes_to_its_model_and_strips_itself() {
        let t = table(&[("m1", &["哪吒", "魔丸哪吒"]), ("m2", &["敖丙"])]);
        for (phrase, model) in [("哪吒", "m1"), ("魔丸哪吒", "m1"), ("敖丙", "m2")] {
            let text = format!("{phrase}吃汤圆 --ar 9:16");
            let route = t.route(&text).unwrap();
            assert_eq!(route.trigger, phrase);
            assert_eq!(route.model_id, model);
            assert_eq!(route.remainder, "吃汤圆 --ar 9:16");
        }
    }

    #[test]
    fn no_match_returns_none() {
        let t = table(&[("m1", &["哪吒"])]);
        assert!(t.route("hello 哪吒").is_none());
        assert!(t.route("").is_none());
    }

    #[test]
    fn match_is_case_sensitive() {
        let t = table(&[("m1", &["cat"])]);
        assert!(t.route("Cat on a mat").is_none());
        assert_eq!(t.route("cat on a mat").unwrap().remainder, " on a mat");
    }

    #[test]
    fn first_declared_prefix_wins_over_longer_phrase() {
        let t = table(&[("short", &["灵珠"]), ("long", &["灵珠哪吒"])]);
        let route = t.route("灵珠哪吒跳舞").unwrap();
        assert_eq!(route.model_id, "short");
        assert_eq!(route.remainder, "哪吒跳舞");
    }

    #[test]
    fn duplicate_phrase_fails_to_load() {
        let cfgs = vec![
            TriggerConfig {
                model_id: "a".to_string(),
                phrases: vec!["x".to_string()],
            },
            TriggerConfig {
                model_id: "b".to_string(),
                phrases: vec!["x".to_string()],
            },
        ];
        assert!(TriggerTable::from_config(&cfgs).is_err());
        assert!(TriggerTable::from_config(&[]).is_err());
    }

    #[test]
    fn help_text_groups_phrases_per_model() {
        let t = table(&[("m1", &["哪吒", "魔丸哪吒"]), ("m2", &["敖丙"])]);
        let help = t.help_text();
        assert!(help.contains("哪吒、魔丸哪吒 | 敖丙"));
        assert!(help.contains("哪吒 drinking coffee --ar 9:16"));
    }
}
