//! Skill descriptors and the lookup table projects resolve against.
//!
//! Projects reference skills by name only. The table is filled once per build
//! from a [`SkillSource`]; names the source does not know are dropped.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Skill {
    pub name: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_world_rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Anything that can describe a skill by name.
pub trait SkillSource: Send + Sync {
    fn lookup(&self, name: &str) -> impl Future<Output = Option<Skill>> + Send;
}

/// Skills declared inline in the catalogue file.
#[derive(Debug, Default)]
pub struct TableSkillSource {
    skills: HashMap<String, Skill>,
}

impl TableSkillSource {
    pub fn new(skills: impl IntoIterator<Item = Skill>) -> Self {
        Self {
            skills: skills.into_iter().map(|s| (s.name.clone(), s)).collect(),
        }
    }
}

impl SkillSource for TableSkillSource {
    async fn lookup(&self, name: &str) -> Option<Skill> {
        self.skills.get(name).cloned()
    }
}

/// Resolved skills, shared by every project of a build.
#[derive(Debug, Default)]
pub struct SkillTable {
    skills: HashMap<String, Skill>,
}

impl SkillTable {
    /// Look up every distinct name once, concurrently.
    pub async fn preload<'a, S: SkillSource>(
        source: &S,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = names.into_iter().filter(|n| seen.insert(*n)).collect();

        let found = join_all(unique.iter().map(|name| source.lookup(name))).await;

        let mut skills = HashMap::new();
        for (name, skill) in unique.iter().zip(found) {
            match skill {
                Some(skill) => {
                    skills.insert((*name).to_string(), skill);
                }
                None => log::debug!("unknown skill {name:?} dropped"),
            }
        }
        Self { skills }
    }

    /// Skills for `names`, in the given order, unknown names omitted.
    pub fn resolve(&self, names: &[String]) -> Vec<Skill> {
        names
            .iter()
            .filter_map(|name| self.skills.get(name).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn skill(name: &str) -> Skill {
        Skill {
            name: name.to_string(),
            image_url: format!("https://img/{name}.svg"),
            top_world_rank: None,
            score: None,
        }
    }

    /// Counts lookups per name.
    struct CountingSource {
        inner: TableSkillSource,
        calls: Mutex<Vec<String>>,
    }

    impl SkillSource for CountingSource {
        async fn lookup(&self, name: &str) -> Option<Skill> {
            self.calls.lock().unwrap().push(name.to_string());
            self.inner.lookup(name).await
        }
    }

    #[tokio::test]
    async fn resolve_preserves_project_order() {
        let source = TableSkillSource::new([skill("Kotlin"), skill("Java"), skill("Rust")]);
        let table = SkillTable::preload(&source, ["Kotlin", "Java", "Rust"]).await;

        let names = vec!["Rust".to_string(), "Kotlin".to_string()];
        let resolved: Vec<_> = table.resolve(&names).into_iter().map(|s| s.name).collect();
        assert_eq!(resolved, vec!["Rust", "Kotlin"]);
    }

    #[tokio::test]
    async fn unknown_names_are_dropped() {
        let source = TableSkillSource::new([skill("Kotlin")]);
        let table = SkillTable::preload(&source, ["Kotlin", "Cobol"]).await;

        assert_eq!(table.len(), 1);
        let names = vec!["Cobol".to_string(), "Kotlin".to_string()];
        assert_eq!(table.resolve(&names), vec![skill("Kotlin")]);
    }

    #[tokio::test]
    async fn preload_looks_up_each_name_once() {
        let source = CountingSource {
            inner: TableSkillSource::new([skill("Kotlin"), skill("Java")]),
            calls: Mutex::new(Vec::new()),
        };
        SkillTable::preload(&source, ["Kotlin", "Java", "Kotlin", "Kotlin"]).await;

        let calls = source.calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["Kotlin", "Java"]);
    }

    #[test]
    fn skill_from_toml_with_metrics() {
        let skill: Skill = toml::from_str(
            r#"
            name = "Kotlin"
            image_url = "https://img/kotlin.svg"
            top_world_rank = 12
            score = 4.5
            "#,
        )
        .unwrap();
        assert_eq!(skill.top_world_rank, Some(12));
        assert_eq!(skill.score, Some(4.5));
    }

    #[test]
    fn skill_json_omits_missing_metrics() {
        let json = serde_json::to_string(&skill("Java")).unwrap();
        assert!(!json.contains("top_world_rank"));
        assert!(!json.contains("score"));
    }
}
