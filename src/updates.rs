//! Set of resources whose local copy is older than the remote one.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::index::SourceTranslation;

/// project id → source language id → stale resource ids.
///
/// An empty set means the check ran and found nothing; a failed check is an
/// error, never an empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateSet {
   projects: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
}

impl UpdateSet {
   pub fn new() -> Self {
      Self::default()
   }

   pub(crate) fn insert(&mut self, st: SourceTranslation) {
      self
         .projects
         .entry(st.project_id)
         .or_default()
         .entry(st.source_language_id)
         .or_default()
         .insert(st.resource_id);
   }

   /// Ids of projects with at least one stale resource.
   pub fn projects(&self) -> Vec<&str> {
      self.projects.keys().map(String::as_str).collect()
   }

   pub fn source_languages(&self, project_id: &str) -> Vec<&str> {
      self
         .projects
         .get(project_id)
         .map(|langs| langs.keys().map(String::as_str).collect())
         .unwrap_or_default()
   }

   pub fn resources(&self, project_id: &str, source_language_id: &str) -> Vec<&str> {
      self
         .projects
         .get(project_id)
         .and_then(|langs| langs.get(source_language_id))
         .map(|res| res.iter().map(String::as_str).collect())
         .unwrap_or_default()
   }

   pub fn contains(&self, st: &SourceTranslation) -> bool {
      self
         .projects
         .get(&st.project_id)
         .and_then(|langs| langs.get(&st.source_language_id))
         .is_some_and(|res| res.contains(&st.resource_id))
   }

   pub fn is_empty(&self) -> bool {
      self.projects.is_empty()
   }

   /// Number of stale resources.
   pub fn len(&self) -> usize {
      self
         .projects
         .values()
         .flat_map(BTreeMap::values)
         .map(BTreeSet::len)
         .sum()
   }

   /// Every stale triple, sorted by project, language, resource.
   pub fn iter(&self) -> impl Iterator<Item = SourceTranslation> + '_ {
      self.projects.iter().flat_map(|(p, langs)| {
         langs.iter().flat_map(move |(sl, res)| {
            res.iter().map(move |r| SourceTranslation::new(p.as_str(), sl.as_str(), r.as_str()))
         })
      })
   }

   /// Stale triples of one project.
   pub fn translations_in(&self, project_id: &str) -> Vec<SourceTranslation> {
      self
         .iter()
         .filter(|st| st.project_id == project_id)
         .collect()
   }
}

impl FromIterator<SourceTranslation> for UpdateSet {
   fn from_iter<I: IntoIterator<Item = SourceTranslation>>(iter: I) -> Self {
      let mut set = Self::new();
      for st in iter {
         set.insert(st);
      }
      set
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn groups_and_sorts_triples() {
      let set: UpdateSet = [
         SourceTranslation::new("mat", "en", "ulb"),
         SourceTranslation::new("gen", "fr", "ulb"),
         SourceTranslation::new("gen", "en", "udb"),
         SourceTranslation::new("gen", "en", "ulb"),
      ]
      .into_iter()
      .collect();

      assert_eq!(set.len(), 4);
      assert_eq!(set.projects(), vec!["gen", "mat"]);
      assert_eq!(set.source_languages("gen"), vec!["en", "fr"]);
      assert_eq!(set.resources("gen", "en"), vec!["udb", "ulb"]);
      assert!(set.resources("gen", "es").is_empty());
      assert!(set.contains(&SourceTranslation::new("mat", "en", "ulb")));
      assert_eq!(set.translations_in("gen").len(), 3);
      assert_eq!(set.iter().next(), Some(SourceTranslation::new("gen", "en", "udb")));
   }

   #[test]
   fn empty_set_is_valid() {
      let set = UpdateSet::new();
      assert!(set.is_empty());
      assert_eq!(set.len(), 0);
      assert!(set.projects().is_empty());
   }
}
