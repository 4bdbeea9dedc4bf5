//! Ranked dub/voice preference groups
//!
//! Each group is a set of aliases for one studio or voice-over team, ordered
//! from most to least preferred. Matching is done by lowercase substring
//! against the voice label reported by the index.

/// Preference-ordered groups of voice aliases.
#[derive(Debug, Clone, Default)]
pub struct VoiceList {
    groups: Vec<Vec<String>>,
}

impl VoiceList {
    pub fn push_group(&mut self, aliases: &[&str]) {
        self.groups.push(aliases.iter().map(|a| a.to_string()).collect());
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[String]> {
        self.groups.iter().map(|g| g.as_slice())
    }

    /// The built-in preference order.
    pub fn default_ranked() -> Self {
        let mut list = VoiceList::default();
        list.push_group(&["сыендук", "syenduk"]);
        list.push_group(&["кубик", "кубе", "kubik", "kube"]);
        list.push_group(&["кураж", "бомбей", "kurazh", "bombej"]);
        list.push_group(&["lostfilm", "lost"]);
        list.push_group(&["newstudio"]);
        list.push_group(&["амедиа", "amedia"]);
        list
    }
}
